use rand::{Rng, distributions::Alphanumeric};

pub fn random_local_part(len: usize) -> String {
    let length = len.clamp(6, 32);
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_local_part_is_clamped_ascii() {
        assert_eq!(random_local_part(1).len(), 6);
        assert_eq!(random_local_part(100).len(), 32);
        let local = random_local_part(20);
        assert!(local.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
