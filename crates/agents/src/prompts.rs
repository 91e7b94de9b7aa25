//! System prompts and user-message rendering.

use copilot_common::AnalysisInput;

pub const ENGINEER_FEEDBACK_PROMPT: &str = r#"You are a senior engineer reviewing a customer conversation for engineering follow-up. Your role is to:

1. Identify technical issues the customer raised and how severe they are
2. Summarize the feedback engineering needs to hear
3. Draw engineering insights from the conversation
4. Recommend actions, each with a priority and a rationale
5. Note patterns likely to recur across other customers
6. Suggest best practices that would have avoided the issues
7. List concrete action items and rate the overall priority

Respond with a single JSON object and nothing else:
{
  "feedback": "<summary of the technical feedback>",
  "action_items": ["<action>", ...],
  "priority": "low" | "medium" | "high",
  "technical_issues": [
    {"issue": "<issue>", "severity": "low" | "medium" | "high", "impact": "<impact>"}
  ],
  "engineering_insights": ["<insight>", ...],
  "recommendations": [
    {"action": "<action>", "priority": "low" | "medium" | "high", "rationale": "<why>"}
  ],
  "systemic_patterns": ["<pattern>", ...],
  "best_practices": ["<practice>", ...]
}
"#;

pub const CUSTOMER_STORY_PROMPT: &str = r#"You are a customer success analyst turning a sales conversation into a customer story. Your role is to:

1. Describe the customer's background and situation
2. Extract the key points of the conversation
3. Judge the customer's overall sentiment
4. List follow-up action items
5. Write a short summary

Use the knowledge base context when it is relevant. Do not invent facts.

Respond with a single JSON object and nothing else:
{
  "customer_background": "<background>",
  "key_points": ["<point>", ...],
  "sentiment": "positive" | "neutral" | "negative",
  "action_items": ["<action>", ...],
  "summary": "<summary>"
}
"#;

/// Render the user turn shared by the completion-backed agents.
pub fn render_input(input: &AnalysisInput, context: &str) -> String {
    let mut out = format!("Transcript:\n{}\n", input.transcript.trim());

    if !input.notes.trim().is_empty() {
        out.push_str(&format!("\nNotes:\n{}\n", input.notes.trim()));
    }
    if !input.record_id.is_empty() {
        out.push_str(&format!("\nRecord ID: {}\n", input.record_id));
    }
    if !context.is_empty() {
        out.push('\n');
        out.push_str(context);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_sections_are_omitted() {
        let input = AnalysisInput {
            transcript: "Customer praised latency improvements.".into(),
            ..Default::default()
        };
        let rendered = render_input(&input, "");
        assert!(rendered.starts_with("Transcript:\nCustomer praised"));
        assert!(!rendered.contains("Notes:"));
        assert!(!rendered.contains("Record ID"));
    }

    #[test]
    fn includes_notes_record_and_context() {
        let input = AnalysisInput {
            transcript: "hello".into(),
            notes: "follow up next week".into(),
            record_id: "12345".into(),
        };
        let rendered = render_input(&input, "Relevant Context from Knowledge Base:\n- prior call");
        assert!(rendered.contains("Notes:\nfollow up next week"));
        assert!(rendered.contains("Record ID: 12345"));
        assert!(rendered.ends_with("- prior call\n"));
    }
}
