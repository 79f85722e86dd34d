//! Prompt construction
//!
//! Renders the rule set and one queued item into the instruction sent to
//! the model. The answer format matches what the response parser accepts.

use crate::domain::entities::{ItemType, ModerationItem, RuleSet};

/// System instruction for providers with a separate system channel
pub const SYSTEM_PROMPT: &str = "You are a Reddit moderator assistant. Respond only with valid JSON.";

/// Build the evaluation prompt for one item
pub fn build_prompt(item: &ModerationItem, rules: &RuleSet) -> String {
    let rules_text = rules
        .iter()
        .map(|rule| format!("Rule {}: {}\nExplanation: {}", rule.number, rule.title, rule.explanation))
        .collect::<Vec<_>>()
        .join("\n");

    let content_type = item.item_type.to_string();
    let content_info = describe_item(item);

    format!(
        "You are a Reddit moderator. Evaluate the following {content_type} against the subreddit's rules.\n\
         Respond with a JSON object containing your moderation decision.\n\
         \n\
         SUBREDDIT RULES:\n\
         {rules_text}\n\
         \n\
         {content_info}\n\
         \n\
         If the {content_type} violates any rule, respond with:\n\
         {{\n  \"violates\": true,\n  \"rule_number\": [rule number],\n  \"explanation\": \"[why it violates this rule]\",\n  \"confidence\": [0.0 to 1.0]\n}}\n\
         \n\
         If the {content_type} does not violate any rule, respond with:\n\
         {{\n  \"violates\": false,\n  \"explanation\": \"[short reasoning]\",\n  \"confidence\": [0.0 to 1.0]\n}}\n\
         \n\
         \"confidence\" is how certain you are of the decision, from 0.0 to 1.0.\n\
         Respond ONLY with the JSON object, nothing else.\n"
    )
}

fn describe_item(item: &ModerationItem) -> String {
    match item.item_type {
        ItemType::Submission => format!(
            "SUBMISSION:\nTitle: {}\nBody: {}\nURL: {}\nDomain: {}",
            item.title.as_deref().unwrap_or("[No title]"),
            non_empty_or(&item.body_text, "[No text content]"),
            item.url.as_deref().unwrap_or("[No URL]"),
            item.domain.as_deref().unwrap_or("[No domain]"),
        ),
        ItemType::Comment => format!(
            "COMMENT:\nBody: {}\nSubreddit: {}\nLink title: {}\nAuthor: {}",
            item.body_text,
            item.subreddit,
            item.link_title.as_deref().unwrap_or("[Unknown]"),
            item.author.as_deref().unwrap_or("[Deleted]"),
        ),
    }
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}
