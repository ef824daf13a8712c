use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Opaque session token for the realtime meeting room tied to an interview.
pub fn generate_room_token() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();
    format!("room-{}", suffix)
}
