//! Prompts for the coach functions

use habitflow_models::{Message, MotivationRequest, UserContext};

pub const COACH_SYSTEM_PROMPT: &str = "You are HabitFlow Coach, a friendly and supportive AI that helps users build positive habits consistently.

Your goals:
1. Guide users to create and track habits.
2. Remember their habit history, progress, mood, struggles, blockers.
3. Give personalized suggestions based on past behavior.
4. Provide short but detailed responses when needed.
5. Support users emotionally and motivate them.

Your behavior:
- Always be friendly, supportive, and encouraging.
- Never judge the user.
- Keep responses short, but when giving important info, add helpful detail.
- Simplify everything: one main suggestion + optional extra tips.
- Use emojis sparingly to add warmth.

What you provide for every message:
1. Understand the user's current state.
2. Use previous history to personalize advice.
3. Give actionable suggestions.
4. Celebrate wins and support through failures.

Special capabilities:
- Suggest micro-habits when user feels overwhelmed
- Adjust habit difficulty based on progress
- Create personalized routines (morning, evening, study, fitness)
- Generate weekly progress reports
- Predict potential struggles and offer preemptive support
- Track patterns like \"You usually struggle on weekends\"

When user fails, say supportive things like:
- \"It's okay. Do a 1-minute version today.\"
- \"Let's bounce back together.\"
- \"Progress isn't linear. You've got this!\"

When user succeeds:
- \"🔥 Amazing! You're building momentum!\"
- \"🎉 Great job! Keep the streak going!\"
- \"You're proving to yourself that you can do this!\"";

const MOTIVATION_SYSTEM_PROMPT: &str = "You are an encouraging habit coach. Generate personalized motivation and tips.
Be warm, supportive, and actionable. Keep responses concise (2-3 sentences max per section).
Use emojis sparingly to add warmth.";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn joined(values: Option<&[String]>) -> Option<String> {
    let joined = values?.join(", ");
    (!joined.is_empty()).then_some(joined)
}

/// System prompt for a coach turn, with the caller's context appended when present
pub fn coach_system_prompt(context: Option<&UserContext>) -> String {
    let Some(context) = context else {
        return COACH_SYSTEM_PROMPT.to_string();
    };

    let habits = context.habits.as_ref().and_then(|habits| {
        let titles: Vec<String> = habits.iter().map(|h| h.title.clone()).collect();
        joined(Some(titles.as_slice()))
    });

    format!(
        "{COACH_SYSTEM_PROMPT}\n\nUser Context:
- Current habits: {}
- Today's progress: {}/{} habits completed
- Current streak data: {}
- Recent mood: {}
- Known struggles: {}
- What motivates them: {}
- Patterns noticed: {}",
        habits.as_deref().unwrap_or("None yet"),
        context.completed_today.unwrap_or(0),
        context.total_habits.unwrap_or(0),
        non_empty(context.streak_info.as_deref()).unwrap_or("Building momentum"),
        non_empty(context.mood.as_deref()).unwrap_or("Not recorded"),
        joined(context.blockers.as_deref()).as_deref().unwrap_or("None identified"),
        joined(context.motivation_triggers.as_deref())
            .as_deref()
            .unwrap_or("Still learning"),
        non_empty(context.patterns.as_deref()).unwrap_or("Still analyzing"),
    )
}

/// Conversation sent to the gateway for a motivation request
pub fn motivation_messages(request: &MotivationRequest) -> Vec<Message> {
    let titles: Vec<String> = request.habits.iter().map(|h| h.title.clone()).collect();
    let habits_list =
        joined(Some(titles.as_slice())).unwrap_or_else(|| "No habits yet".to_string());

    let user_prompt = format!(
        "User's habits: {habits_list}
Completed today: {}/{} ({}%)
User's mood: {}
User's reflection: {}

Generate a JSON response with these exact fields:
{{
  \"motivation\": \"A personalized motivational message based on their progress\",
  \"tips\": [\"tip1\", \"tip2\", \"tip3\"],
  \"encouragement\": \"A brief encouraging closing message\"
}}",
        request.completed_today,
        request.habits.len(),
        request.completion_rate(),
        non_empty(request.mood.as_deref()).unwrap_or("not specified"),
        non_empty(request.reflection.as_deref()).unwrap_or("none provided"),
    );

    vec![
        Message::system(MOTIVATION_SYSTEM_PROMPT),
        Message::user(user_prompt),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use habitflow_models::HabitSummary;

    #[test]
    fn prompt_without_context_is_persona_only() {
        assert_eq!(coach_system_prompt(None), COACH_SYSTEM_PROMPT);
    }

    #[test]
    fn empty_context_uses_defaults() {
        let prompt = coach_system_prompt(Some(&UserContext::default()));
        assert!(prompt.starts_with(COACH_SYSTEM_PROMPT));
        assert!(prompt.contains("- Current habits: None yet"));
        assert!(prompt.contains("- Today's progress: 0/0 habits completed"));
        assert!(prompt.contains("- Current streak data: Building momentum"));
        assert!(prompt.contains("- Known struggles: None identified"));
        assert!(prompt.ends_with("- Patterns noticed: Still analyzing"));
    }

    #[test]
    fn context_fields_are_rendered() {
        let context = UserContext {
            habits: Some(vec![
                HabitSummary {
                    title: "Read".into(),
                },
                HabitSummary {
                    title: "Run".into(),
                },
            ]),
            completed_today: Some(1),
            total_habits: Some(2),
            mood: Some("tired".into()),
            blockers: Some(vec!["late nights".into(), "travel".into()]),
            ..Default::default()
        };
        let prompt = coach_system_prompt(Some(&context));
        assert!(prompt.contains("- Current habits: Read, Run"));
        assert!(prompt.contains("- Today's progress: 1/2 habits completed"));
        assert!(prompt.contains("- Recent mood: tired"));
        assert!(prompt.contains("- Known struggles: late nights, travel"));
        assert!(prompt.contains("- What motivates them: Still learning"));
    }

    #[test]
    fn motivation_prompt_reports_progress() {
        let request = MotivationRequest {
            habits: vec![
                HabitSummary {
                    title: "Meditate".into(),
                },
                HabitSummary {
                    title: "Journal".into(),
                },
            ],
            completed_today: 1,
            mood: None,
            reflection: Some("Good day".into()),
        };
        let messages = motivation_messages(&request);
        assert_eq!(messages.len(), 2);
        let user = &messages[1].content;
        assert!(user.contains("User's habits: Meditate, Journal"));
        assert!(user.contains("Completed today: 1/2 (50%)"));
        assert!(user.contains("User's mood: not specified"));
        assert!(user.contains("User's reflection: Good day"));
    }
}
