//! Resolution of reciter reads: which surahs a reciter offers and which read
//! (and therefore which audio file) plays a given surah.
//!
//! Nothing here validates surah ids against the 114 canonical chapters. An
//! id outside that range in the catalog data flows through unchanged; the
//! display layer simply has no name for it.

use std::collections::BTreeSet;

use crate::models::Read;
use crate::ranges::{parse_ranges, ranges};

/// Extension of the per-surah audio files served under a read's base URL.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Sorted, de-duplicated union of every surah covered by `reads`.
pub fn all_surahs_for(reads: &[Read]) -> Vec<u32> {
    reads
        .iter()
        .flat_map(|read| parse_ranges(&read.suras))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// First read, in the order given, whose range covers `surah`.
///
/// When two reads cover the same surah (the same reciter under two
/// narrations, typically) the earlier one wins. `None` means no read has it.
pub fn resolve_read_for_surah(reads: &[Read], surah: u32) -> Option<&Read> {
    reads
        .iter()
        .find(|read| ranges(&read.suras).any(|id| id == surah))
}

/// Audio URL of `surah` within `read`: base URL plus the id padded to three
/// digits, e.g. `https://host/path/007.mp3`.
pub fn surah_audio_url(read: &Read, surah: u32) -> String {
    format!("{}{:03}.{}", read.url, surah, AUDIO_EXTENSION)
}

/// Everything the player needs once a surah has been matched to a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSurah {
    pub read_id: u32,
    pub surah: u32,
    pub url: String,
}

impl ResolvedSurah {
    /// Identifier published on the playback marker while this surah plays.
    pub fn playback_id(&self) -> String {
        format!("surah-{}-{}", self.read_id, self.surah)
    }
}

/// Resolve `surah` against `reads` and build its audio URL.
pub fn resolve_surah(reads: &[Read], surah: u32) -> Option<ResolvedSurah> {
    resolve_read_for_surah(reads, surah).map(|read| ResolvedSurah {
        read_id: read.id,
        surah,
        url: surah_audio_url(read, surah),
    })
}

/// Arabic name of a canonical surah, `None` outside 1..=114.
pub fn surah_name(id: u32) -> Option<&'static str> {
    let index = usize::try_from(id).ok()?.checked_sub(1)?;
    SURAH_NAMES.get(index).copied()
}

const SURAH_NAMES: [&str; 114] = [
    "الفاتحة",
    "البقرة",
    "آل عمران",
    "النساء",
    "المائدة",
    "الأنعام",
    "الأعراف",
    "الأنفال",
    "التوبة",
    "يونس",
    "هود",
    "يوسف",
    "الرعد",
    "إبراهيم",
    "الحجر",
    "النحل",
    "الإسراء",
    "الكهف",
    "مريم",
    "طه",
    "الأنبياء",
    "الحج",
    "المؤمنون",
    "النور",
    "الفرقان",
    "الشعراء",
    "النمل",
    "القصص",
    "العنكبوت",
    "الروم",
    "لقمان",
    "السجدة",
    "الأحزاب",
    "سبأ",
    "فاطر",
    "يس",
    "الصافات",
    "ص",
    "الزمر",
    "غافر",
    "فصلت",
    "الشورى",
    "الزخرف",
    "الدخان",
    "الجاثية",
    "الأحقاف",
    "محمد",
    "الفتح",
    "الحجرات",
    "ق",
    "الذاريات",
    "الطور",
    "النجم",
    "القمر",
    "الرحمن",
    "الواقعة",
    "الحديد",
    "المجادلة",
    "الحشر",
    "الممتحنة",
    "الصف",
    "الجمعة",
    "المنافقون",
    "التغابن",
    "الطلاق",
    "التحريم",
    "الملك",
    "القلم",
    "الحاقة",
    "المعارج",
    "نوح",
    "الجن",
    "المزمل",
    "المدثر",
    "القيامة",
    "الإنسان",
    "المرسلات",
    "النبأ",
    "النازعات",
    "عبس",
    "التكوير",
    "الانفطار",
    "المطففين",
    "الانشقاق",
    "البروج",
    "الطارق",
    "الأعلى",
    "الغاشية",
    "الفجر",
    "البلد",
    "الشمس",
    "الليل",
    "الضحى",
    "الشرح",
    "التين",
    "العلق",
    "القدر",
    "البينة",
    "الزلزلة",
    "العاديات",
    "القارعة",
    "التكاثر",
    "العصر",
    "الهمزة",
    "الفيل",
    "قريش",
    "الماعون",
    "الكوثر",
    "الكافرون",
    "النصر",
    "المسد",
    "الإخلاص",
    "الفلق",
    "الناس",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn read(id: u32, url: &str, suras: &str) -> Read {
        Read {
            id,
            name: format!("read {id}"),
            rewaya: String::new(),
            url: url.to_string(),
            suras: suras.to_string(),
            letter: None,
        }
    }

    #[test]
    fn overlapping_reads_collapse_into_sorted_union() {
        let reads = vec![read(1, "https://a/", "3-5"), read(2, "https://b/", "1-3")];
        assert_eq!(all_surahs_for(&reads), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn union_of_nothing_is_empty() {
        assert!(all_surahs_for(&[]).is_empty());
        assert!(all_surahs_for(&[read(1, "https://a/", "oops")]).is_empty());
    }

    #[test]
    fn union_passes_out_of_range_ids_through() {
        let reads = vec![read(1, "https://a/", "114,115,0")];
        assert_eq!(all_surahs_for(&reads), vec![0, 114, 115]);
    }

    #[test]
    fn first_covering_read_wins() {
        let reads = vec![read(1, "https://a/", "1-5"), read(2, "https://b/", "3-10")];
        let found = resolve_read_for_surah(&reads, 4).unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(resolve_read_for_surah(&reads, 8).unwrap().id, 2);
    }

    #[test]
    fn uncovered_surah_is_not_found() {
        let reads = vec![read(1, "https://a/", "1-10")];
        assert!(resolve_read_for_surah(&reads, 114).is_none());
    }

    #[test]
    fn audio_url_is_zero_padded() {
        let r = read(1, "https://host/path/", "7");
        assert_eq!(surah_audio_url(&r, 7), "https://host/path/007.mp3");
        assert_eq!(surah_audio_url(&r, 114), "https://host/path/114.mp3");
    }

    #[test]
    fn resolving_end_to_end_builds_url_and_marker() {
        let reads = vec![read(1, "https://x/", "1-2")];
        let resolved = resolve_surah(&reads, 2).unwrap();
        assert_eq!(resolved.read_id, 1);
        assert_eq!(resolved.url, "https://x/002.mp3");
        assert_eq!(resolved.playback_id(), "surah-1-2");
        assert!(resolve_surah(&reads, 3).is_none());
    }

    #[test]
    fn surah_names_cover_the_canon_only() {
        assert_eq!(surah_name(1), Some("الفاتحة"));
        assert_eq!(surah_name(114), Some("الناس"));
        assert_eq!(surah_name(0), None);
        assert_eq!(surah_name(115), None);
    }
}
