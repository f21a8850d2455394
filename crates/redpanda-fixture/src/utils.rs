const ALPHANUMERIC: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Generates a unique container name with the given prefix.
pub(crate) fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!(8, ALPHANUMERIC))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_prefixed_and_distinct() {
        let first = unique_name("redpanda");
        let second = unique_name("redpanda");

        assert!(first.starts_with("redpanda-"));
        assert_eq!(first.len(), "redpanda-".len() + 8);
        assert!(first["redpanda-".len()..].chars().all(|c| ALPHANUMERIC.contains(&c)));
        assert_ne!(first, second);
    }
}
