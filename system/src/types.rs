pub type ParticipantId = String;
pub type SessionCode = String;

/// Generates the id a client announces when it connects, e.g. `user3f09a1c2b`.
pub fn new_participant_id() -> ParticipantId {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("user{}", &token[..9])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_ids_are_prefixed_and_distinct() {
        let a = new_participant_id();
        let b = new_participant_id();
        assert!(a.starts_with("user"));
        assert_eq!(a.len(), 13);
        assert!(a[4..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
