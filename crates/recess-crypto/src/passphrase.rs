use rand::seq::SliceRandom;
use rand::Rng;

/// Letters and digits with look-alike characters (`i l L I o O 0`) removed.
const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyzABCDEFGHJKMNPQRSTUVWXYZ123456789";

/// Shortest generated passphrase.
pub const MIN_PASSPHRASE_LEN: usize = 20;

/// Longest generated passphrase.
pub const MAX_PASSPHRASE_LEN: usize = 40;

/// Generate a random alphanumeric passphrase.
///
/// Length is drawn from `20..=40`. No character appears three or more times
/// in a row, so the result always passes the default [`PasswordPolicy`]
/// as a passphrase.
///
/// [`PasswordPolicy`]: crate::policy::PasswordPolicy
pub fn generate_passphrase<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN);
    let mut out: Vec<u8> = Vec::with_capacity(len);
    while out.len() < len {
        let Some(&c) = ALPHABET.choose(rng) else {
            break;
        };
        let n = out.len();
        if n >= 2 && out[n - 1] == c && out[n - 2] == c {
            continue;
        }
        out.push(c);
    }
    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn length_is_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = generate_passphrase(&mut rng);
            assert!((MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN).contains(&p.len()));
        }
    }

    #[test]
    fn only_unambiguous_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let p = generate_passphrase(&mut rng);
            assert!(p.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(!p.contains(['i', 'l', 'L', 'I', 'o', 'O', '0']));
        }
    }

    #[test]
    fn never_three_in_a_row() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let p: Vec<char> = generate_passphrase(&mut rng).chars().collect();
            assert!(p.windows(3).all(|w| !(w[0] == w[1] && w[1] == w[2])));
        }
    }

    #[test]
    fn thread_rng_works() {
        let p = generate_passphrase(&mut rand::thread_rng());
        assert!(p.len() >= MIN_PASSPHRASE_LEN);
    }
}
