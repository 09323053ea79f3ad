#[cfg(test)]
mod tests {
    use crate::error::BookingError;
    use crate::vault::{decrypt, encrypt, Vault};
    use base64::{engine::general_purpose, Engine as _};
    use proptest::prelude::*;

    const SECRET: &str = "correct horse battery staple";

    #[test]
    fn test_round_trip() {
        for plaintext in ["1//0gRefreshToken-abc", "", "ünïcödé ✓"] {
            let blob = encrypt(plaintext, SECRET).unwrap();
            assert_eq!(decrypt(&blob, SECRET).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_nonce_is_fresh_per_encryption() {
        let a = encrypt("same token", SECRET).unwrap();
        let b = encrypt("same token", SECRET).unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("same token"));
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = encrypt("1//0gRefreshToken-abc", SECRET).unwrap();
        let err = decrypt(&blob, "a rotated secret").unwrap_err();
        assert!(matches!(err, BookingError::Decryption(_)));
    }

    #[test]
    fn test_tampered_blob_fails() {
        let blob = encrypt("1//0gRefreshToken-abc", SECRET).unwrap();
        let mut raw = general_purpose::STANDARD.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = general_purpose::STANDARD.encode(&raw);
        assert!(matches!(
            decrypt(&tampered, SECRET),
            Err(BookingError::Decryption(_))
        ));

        // flip a ciphertext byte right after the nonce
        let mut raw = general_purpose::STANDARD.decode(&blob).unwrap();
        raw[12] ^= 0x80;
        let tampered = general_purpose::STANDARD.encode(&raw);
        assert!(matches!(
            decrypt(&tampered, SECRET),
            Err(BookingError::Decryption(_))
        ));
    }

    #[test]
    fn test_truncated_and_malformed_blobs_fail() {
        let blob = encrypt("1//0gRefreshToken-abc", SECRET).unwrap();
        let raw = general_purpose::STANDARD.decode(&blob).unwrap();
        let truncated = general_purpose::STANDARD.encode(&raw[..20]);
        assert!(matches!(
            decrypt(&truncated, SECRET),
            Err(BookingError::Decryption(_))
        ));
        assert!(matches!(
            decrypt("not base64 at all!", SECRET),
            Err(BookingError::Decryption(_))
        ));
    }

    // Every case derives the key with PBKDF2, so keep the case count low.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_round_trip_any_string(plaintext in any::<String>()) {
            let blob = encrypt(&plaintext, SECRET).unwrap();
            prop_assert_eq!(decrypt(&blob, SECRET).unwrap(), plaintext);
        }

        #[test]
        fn prop_round_trip_non_ascii(plaintext in "\\PC{0,64}") {
            let blob = encrypt(&plaintext, SECRET).unwrap();
            prop_assert_eq!(decrypt(&blob, SECRET).unwrap(), plaintext);
        }

        #[test]
        fn prop_other_secret_never_decrypts(plaintext in any::<String>(), other in "[a-z]{1,24}") {
            prop_assume!(other != SECRET);
            let blob = encrypt(&plaintext, SECRET).unwrap();
            prop_assert!(matches!(decrypt(&blob, &other), Err(BookingError::Decryption(_))));
        }
    }

    #[test]
    fn test_fixed_secret_vault() {
        let vault = Vault::with_secret(SECRET);
        let blob = vault.encrypt("token").unwrap();
        assert_eq!(vault.decrypt(&blob).unwrap(), "token");
        assert_eq!(decrypt(&blob, SECRET).unwrap(), "token");
    }
}
