/// Turns a job title into a stable URL segment: lowercase, ASCII
/// alphanumerics kept, every other run of characters folded into one hyphen.
pub fn slugify(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let mut slug = String::with_capacity(lowered.len());
    let mut prev_was_hyphen = true; // swallows leading hyphens
    for c in lowered.chars() {
        if c == '-' {
            if !prev_was_hyphen {
                slug.push('-');
            }
            prev_was_hyphen = true;
        } else {
            slug.push(c);
            prev_was_hyphen = false;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Backend Engineer"), "backend-engineer");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("Senior C++ / Rust Developer"), "senior-c-rust-developer");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(slugify("  Node.js!  "), "node-js");
        assert_eq!(slugify("---"), "");
    }
}
