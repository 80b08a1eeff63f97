//! Reply sanitizers for completion output.
//!
//! A general-chat completion performs no actions, so any sentence claiming
//! one (delivery confirmations, calendar writes) is fabricated and gets
//! stripped, along with capability menus and idle filler. Stripping works
//! sentence by sentence so legitimate content in the same reply survives.

/// Claims of actions the chat branch never performs.
const FABRICATED_ACTION_PHRASES: &[&str] = &[
    "i've sent",
    "i have sent",
    "i sent",
    "message has been sent",
    "your message was sent",
    "i've scheduled",
    "i have scheduled",
    "i've added it to your calendar",
    "i have added it to your calendar",
    "added to your calendar",
    "i'll send it right away",
    "i will send it right away",
];

/// Unprompted capability menus.
const CAPABILITY_MENU_PHRASES: &[&str] = &[
    "i can help you with:",
    "here's what i can do",
    "here is what i can do",
    "my capabilities include",
    "i am able to help with the following",
];

/// Idle filler that carries no content.
const IDLE_FILLER_PHRASES: &[&str] = &[
    "let me know if you need anything else",
    "let me know if there's anything else",
    "feel free to ask",
    "is there anything else i can help",
];

const FALLBACK_REPLY: &str = "Could you tell me a bit more about what you need?";

fn is_banned(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    FABRICATED_ACTION_PHRASES
        .iter()
        .chain(CAPABILITY_MENU_PHRASES)
        .chain(IDLE_FILLER_PHRASES)
        .any(|p| lower.contains(p))
}

/// Split into sentences, keeping each terminator with its sentence.
fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?' | '\n') {
            if !current.trim().is_empty() {
                out.push(current.trim().to_string());
            }
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

/// Strip banned sentences from a completion reply. An entirely-stripped
/// reply falls back to a neutral clarification prompt.
pub fn sanitize_reply(text: &str) -> String {
    let kept: Vec<String> = sentences(text)
        .into_iter()
        .filter(|s| !is_banned(s))
        .collect();
    if kept.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        kept.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_claim_stripped() {
        let out = sanitize_reply("I've sent the message to Maria. The meeting is at noon.");
        assert!(!out.to_lowercase().contains("sent"));
        assert!(out.contains("meeting is at noon"));
    }

    #[test]
    fn test_capability_menu_stripped() {
        let out = sanitize_reply(
            "Here's what I can do: schedule, remind, chat.\nYour meeting is tomorrow.",
        );
        assert!(!out.to_lowercase().contains("what i can do"));
        assert!(out.contains("tomorrow"));
    }

    #[test]
    fn test_idle_filler_stripped() {
        let out = sanitize_reply("The report is due Friday. Let me know if you need anything else!");
        assert_eq!(out, "The report is due Friday.");
    }

    #[test]
    fn test_fully_banned_reply_falls_back() {
        let out = sanitize_reply("I've sent it! Let me know if you need anything else.");
        assert_eq!(out, FALLBACK_REPLY);
    }

    #[test]
    fn test_clean_reply_untouched() {
        let input = "Your next appointment is Thursday at 10:00.";
        assert_eq!(sanitize_reply(input), input);
    }
}
