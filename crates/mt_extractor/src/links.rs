use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(r"https?://\S+").expect("valid URL regex");
    static ref TRANSLATE_COMMAND: Regex =
        Regex::new(r"^/translate(?:@\w+)?(?:\s+|$)(?s)(.*)$").expect("valid command regex");
}

/// Punctuation that ends a sentence rather than a link.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '"', '\'', ')', ']', '>'];

/// The first well-formed http(s) link in `text`.
pub fn first_url(text: &str) -> Option<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .find(|candidate| Url::parse(candidate).is_ok())
        .map(str::to_string)
}

/// A `/translate` command, with the link it carries if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Translate(Option<String>),
}

pub fn parse_command(text: &str) -> Option<Command> {
    let captures = TRANSLATE_COMMAND.captures(text.trim())?;
    let argument = captures.get(1).map_or("", |m| m.as_str());
    Some(Command::Translate(first_url(argument)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_url() {
        assert_eq!(
            first_url("Read more: https://mihaaru.com/news/12345 ..."),
            Some("https://mihaaru.com/news/12345".to_string())
        );
        assert_eq!(
            first_url("two links http://a.example/x and https://b.example/y"),
            Some("http://a.example/x".to_string())
        );
        assert_eq!(
            first_url("(see https://mihaaru.com/news/1)."),
            Some("https://mihaaru.com/news/1".to_string())
        );
        assert_eq!(first_url("no links here"), None);
        assert_eq!(first_url("https://"), None);
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("/translate https://mihaaru.com/news/1"),
            Some(Command::Translate(Some("https://mihaaru.com/news/1".to_string())))
        );
        assert_eq!(
            parse_command("/translate@mt_bot   https://mihaaru.com/news/2"),
            Some(Command::Translate(Some("https://mihaaru.com/news/2".to_string())))
        );
        assert_eq!(parse_command("/translate"), Some(Command::Translate(None)));
        assert_eq!(parse_command("/translate please"), Some(Command::Translate(None)));
        assert_eq!(parse_command("/translated https://x.example"), None);
        assert_eq!(parse_command("check https://mihaaru.com/news/1"), None);
    }
}
