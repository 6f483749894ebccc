//! Text the bot posts to Slack and returns to admin callers.

use chrono::NaiveDate;

/// Human-readable date used to tag a check-in.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Summary posted to the main channel when a check-in opens.
pub fn summary(date: NaiveDate) -> String {
    format!(
        "Check-in for {} is open. Responses will be posted in this thread.",
        format_date(date)
    )
}

/// Direct message asking a member for their update.
pub fn checkin_request(date: NaiveDate) -> String {
    format!(
        "Hi! It's time for the check-in for {}. Reply to this message with your status update. \
         Please keep it to a single message, only your first reply is recorded.",
        format_date(date)
    )
}

/// Reminder for members who have not answered yet.
pub fn reminder() -> &'static str {
    "Reminder: the check-in is still open and we haven't heard from you. \
     Reply here with your status update in a single message."
}

/// Relay of a member's answer into the summary thread.
pub fn relayed_response(name: &str, text: &str) -> String {
    format!("{}'s Response: {}", name, text)
}

/// Private acknowledgement after a response is recorded.
pub fn response_ack() -> &'static str {
    "Thanks! Your response has been posted to the check-in thread."
}

/// Notice for a second reply from the same member.
pub fn already_responded() -> &'static str {
    "You already responded to this check-in. Please use the check-in thread for any follow-up."
}

/// Notice for a reply from someone outside the open check-in.
pub fn not_in_session() -> &'static str {
    "You are not part of an open check-in session."
}

/// Closing message, naming whoever never answered.
pub fn closing(missing: &[String]) -> String {
    let mut text = "Checkin is now closed.".to_string();
    if !missing.is_empty() {
        text.push_str(&format!(
            " The following people did not complete it: {}.",
            join_names(missing)
        ));
    }
    text
}

/// Join names as `a`, `a and b`, or `a, b and c`.
pub fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Admin confirmation for a newly opened check-in.
pub fn opened(roster_size: usize) -> String {
    format!("Check-in opened for {} members.", roster_size)
}

/// Admin notice when a check-in is already running.
pub fn already_open() -> &'static str {
    "A check-in is already open. Close it before opening a new one."
}

/// Admin confirmation for reminders.
pub fn reminded(count: usize) -> String {
    format!("Reminder sent to {} members.", count)
}

/// Admin notice when there is no check-in to act on.
pub fn no_open_session() -> &'static str {
    "There is no open check-in."
}

/// Admin confirmation for a closed check-in.
pub fn closed(missing: usize) -> String {
    format!("Check-in closed. {} members did not respond.", missing)
}

/// Rejection returned to non-admin actors.
pub fn not_authorized() -> &'static str {
    "You are not authorized to manage check-ins."
}
