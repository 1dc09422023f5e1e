//! Non-fatal documentation diagnostics (missing comments and the like).

use tracing::warn;

/// Collects diagnostics for the run report, optionally echoing each one as a
/// TeamCity service message on stdout.
#[derive(Debug, Default)]
pub struct Diagnostics {
    teamcity: bool,
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new(teamcity: bool) -> Self {
        Self {
            teamcity,
            messages: Vec::new(),
        }
    }

    pub fn report(&mut self, message: String) {
        warn!(target: "nodedocs::diagnostics", "{}", message);
        if self.teamcity {
            println!("{}", teamcity_message(&message));
        }
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// `##teamcity[message status='WARNING' text='...']` with TeamCity escaping.
pub fn teamcity_message(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '|' => escaped.push_str("||"),
            '\'' => escaped.push_str("|'"),
            '[' => escaped.push_str("|["),
            ']' => escaped.push_str("|]"),
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            c => escaped.push(c),
        }
    }
    format!("##teamcity[message status='WARNING' text='{}']", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teamcity_escaping() {
        assert_eq!(
            teamcity_message("No doc for class: A'b [x]|y"),
            "##teamcity[message status='WARNING' text='No doc for class: A|'b |[x|]||y']"
        );
    }

    #[test]
    fn messages_are_collected_in_order() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.report("first".to_string());
        diagnostics.report("second".to_string());
        assert_eq!(diagnostics.messages(), ["first", "second"]);
    }
}
