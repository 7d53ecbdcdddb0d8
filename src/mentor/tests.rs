//! Tests for mentor module

#[cfg(test)]
mod tests {
    use super::super::handlers::build_chat_prompt;
    use super::super::models::MentorMessage;

    fn message(role: &str, content: &str) -> MentorMessage {
        MentorMessage {
            id: "M_TEST".to_string(),
            user_id: "U_TEST".to_string(),
            role: role.to_string(),
            content: content.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_prompt_without_history_is_bare_message() {
        let prompt = build_chat_prompt(&[], "How do I negotiate salary?");
        assert_eq!(prompt, "How do I negotiate salary?");
    }

    #[test]
    fn test_prompt_replays_turns_in_order() {
        let recent = vec![
            message("user", "Should I follow up after an interview?"),
            message("assistant", "Yes, within a couple of days."),
        ];

        let prompt = build_chat_prompt(&recent, "What should the email say?");

        let user_pos = prompt
            .find("Candidate: Should I follow up")
            .expect("first turn present");
        let mentor_pos = prompt
            .find("Mentor: Yes, within")
            .expect("second turn present");
        let new_pos = prompt
            .find("Candidate: What should the email say?")
            .expect("new message present");

        assert!(user_pos < mentor_pos);
        assert!(mentor_pos < new_pos);
    }
}
