//! Command-tree attenuation (§4.2 step 5)
//!
//! A command is a dotted hierarchical path (`nil.db.queries.read`).
//! `attenuates(command, required)` holds when `command` is `required`
//! itself or one of its dotted extensions.

pub fn attenuates(command: &str, required: &str) -> bool {
    command == required
        || command
            .strip_prefix(required)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_command_attenuates_itself() {
        assert!(attenuates("nil.db.queries.read", "nil.db.queries.read"));
    }

    #[test]
    fn extension_attenuates_prefix() {
        assert!(attenuates("a.b.c", "a.b"));
    }

    #[test]
    fn sibling_does_not_attenuate() {
        assert!(!attenuates("a.x", "a.b"));
    }

    #[test]
    fn partial_segment_match_is_not_attenuation() {
        assert!(!attenuates("a.bc", "a.b"));
    }
}
