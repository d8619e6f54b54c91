use memorial_manager::catalog::{fetch_or_empty, parse_reads, parse_reciters, CatalogError};
use memorial_manager::reciters::{resolve_surah, surah_name};
use memorial_manager::{all_surahs_for, parse_ranges, resolve_read_for_surah, surah_audio_url};

const RECITER_BODY: &str = r#"{
  "reciters": [
    {
      "id": 123,
      "name": "عبد الباسط عبد الصمد",
      "letter": "ع",
      "date": "2020-01-01",
      "moshaf": [
        {
          "id": 1,
          "name": "حفص عن عاصم - مرتل",
          "server": "https://server7.mp3quran.net/basit/",
          "surah_total": 3,
          "moshaf_type": 11,
          "surah_list": "1,2,3"
        },
        {
          "id": 2,
          "name": "حفص عن عاصم - مجود",
          "server": "https://server7.mp3quran.net/basit/Almusshaf-Al-Mojawwad/",
          "surah_total": 5,
          "moshaf_type": 12,
          "surah_list": "2-5"
        }
      ]
    }
  ]
}"#;

#[test]
fn catalog_payload_resolves_to_playable_urls() {
    let reads = parse_reads(RECITER_BODY).unwrap();
    assert_eq!(reads.len(), 2);

    assert_eq!(all_surahs_for(&reads), vec![1, 2, 3, 4, 5]);

    let read = resolve_read_for_surah(&reads, 2).unwrap();
    assert_eq!(read.id, 1);
    assert_eq!(
        surah_audio_url(read, 2),
        "https://server7.mp3quran.net/basit/002.mp3"
    );

    let resolved = resolve_surah(&reads, 5).unwrap();
    assert_eq!(resolved.read_id, 2);
    assert_eq!(
        resolved.url,
        "https://server7.mp3quran.net/basit/Almusshaf-Al-Mojawwad/005.mp3"
    );
    assert_eq!(resolved.playback_id(), "surah-2-5");

    assert!(resolve_surah(&reads, 6).is_none());
}

#[test]
fn reciter_list_keeps_names_and_tolerates_missing_reads() {
    let reciters = parse_reciters(r#"{"reciters":[{"id":9,"name":"Minshawi"}]}"#).unwrap();
    assert_eq!(reciters.len(), 1);
    assert_eq!(reciters[0].name, "Minshawi");
    assert!(reciters[0].reads.is_empty());
    assert!(parse_reads(r#"{"reciters":[]}"#).unwrap().is_empty());
}

#[test]
fn broken_payloads_become_an_empty_list_with_an_error() {
    let fetched = fetch_or_empty(parse_reads("<html>"));
    assert!(fetched.items.is_empty());
    assert!(matches!(fetched.error, Some(CatalogError::Decode(_))));
}

#[test]
fn parser_and_names_agree_on_the_canon() {
    let all = parse_ranges("1-114");
    assert_eq!(all.len(), 114);
    assert!(all.iter().all(|id| surah_name(*id).is_some()));
    assert_eq!(surah_name(1), Some("الفاتحة"));
    assert_eq!(surah_name(115), None);
}
