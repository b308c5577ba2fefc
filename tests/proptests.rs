use proptest::prelude::*;
use spats_rs::seq::{Fragment, FRAGMENT_CAPACITY};
use spats_rs::util::dna;

proptest! {
    // 文本 → 片段 → 文本，N 原样保留
    #[test]
    fn parse_render_round_trip(s in "[ACGTN]{0,64}") {
        let f = Fragment::parse(s.as_bytes());
        prop_assert_eq!(f.len(), s.len());
        prop_assert_eq!(f.to_string(), s.clone());
        prop_assert_eq!(f.has_errors(), s.contains('N'));
    }

    #[test]
    fn equality_matches_text(a in "[ACGTN]{1,40}", b in "[ACGTN]{1,40}") {
        let (fa, fb) = (Fragment::parse(a.as_bytes()), Fragment::parse(b.as_bytes()));
        prop_assert!(fa == fa.clone());
        prop_assert_eq!(fa == fb, fb == fa);
        prop_assert_eq!(fa == fb, a == b);
    }

    #[test]
    fn insert_then_delete_restores(s in "[ACGTN]{0,63}", pos in 0usize..64, nt in 0u64..4) {
        let orig = Fragment::parse(s.as_bytes());
        let pos = pos % (s.len() + 1);
        let mut f = orig.clone();
        f.insert(pos, nt);
        prop_assert_eq!(f.len(), s.len() + 1);
        prop_assert_eq!(f.at(pos), nt);
        prop_assert!(!f.is_error(pos));
        f.delete(pos);
        prop_assert_eq!(f, orig);
    }

    #[test]
    fn insert_shifts_the_text(s in "[ACGT]{0,63}", pos in 0usize..64, nt in 0u64..4) {
        let pos = pos % (s.len() + 1);
        let mut f = Fragment::parse(s.as_bytes());
        f.insert(pos, nt);
        let mut expected = s.as_bytes().to_vec();
        expected.insert(pos, dna::from_bits(nt));
        prop_assert_eq!(f.to_string().into_bytes(), expected);
    }

    #[test]
    fn truncate_is_a_prefix(s in "[ACGTN]{0,64}", len in 0usize..=FRAGMENT_CAPACITY) {
        let mut f = Fragment::parse(s.as_bytes());
        f.truncate(len);
        let keep = len.min(s.len());
        prop_assert_eq!(f, Fragment::parse(&s.as_bytes()[..keep]));
    }

    #[test]
    fn revcomp_is_an_involution(s in "[ACGTN]{0,80}") {
        prop_assert_eq!(dna::revcomp(&dna::revcomp(s.as_bytes())), s.as_bytes().to_vec());
    }
}
