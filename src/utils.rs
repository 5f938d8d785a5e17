/// Uppercases the first letter of every run of letters and lowercases the
/// rest, so `first_name` becomes `First_Name`.
pub(crate) fn title(input: &str) -> String {
    let mut previous_is_letter = false;
    input
        .chars()
        .map(|c| {
            let mapped = if previous_is_letter {
                c.to_lowercase().collect::<String>()
            } else {
                c.to_uppercase().collect::<String>()
            };
            previous_is_letter = c.is_alphabetic();
            mapped
        })
        .collect()
}

pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_capitalizes_each_word() {
        assert_eq!(title("first_name"), "First_Name");
        assert_eq!(title("ID"), "Id");
        assert_eq!(title("age2x"), "Age2X");
    }

    #[test]
    fn escape_replaces_ampersand_first() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }
}
