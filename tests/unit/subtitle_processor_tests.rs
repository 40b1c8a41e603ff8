/*!
 * Tests for the segment model and SRT/JSON handling
 */

use anyhow::Result;

use subweave::subtitle_processor::{CueTextMode, Segment, SegmentCollection};
use crate::common;

#[test]
fn test_load_withSrtFile_shouldParseAllEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "talk.en.srt")?;

    let collection = SegmentCollection::load(&path)?;

    assert_eq!(collection.segments.len(), 3);
    assert_eq!(collection.segments[0].original, "This is a test subtitle.");
    assert_eq!(collection.segments[1].start, 5.0);
    assert_eq!(collection.segments[2].end, 14.0);
    assert!(collection.segments.iter().all(|s| s.translation.is_empty()));
    Ok(())
}

#[test]
fn test_load_withUnsortedJson_shouldSortAndReindex() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let json = r#"[
        {"index": 7, "start": 5.0, "end": 6.0, "text": "second"},
        {"index": 3, "start": 1.0, "end": 2.0, "original": "first", "translation": "premier"}
    ]"#;
    let path = common::create_test_file(temp_dir.path(), "talk.json", json)?;

    let collection = SegmentCollection::load(&path)?;

    let indices: Vec<usize> = collection.segments.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(collection.segments[0].original, "first");
    assert_eq!(collection.segments[0].translation, "premier");
    assert_eq!(collection.segments[1].original, "second");
    Ok(())
}

#[test]
fn test_load_withEmptyFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "empty.srt", "")?;

    assert!(SegmentCollection::load(&path).is_err());
    Ok(())
}

#[test]
fn test_writeToSrt_dualMode_shouldStackTranslationOverSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("out/talk.fr.srt");
    let collection = SegmentCollection::new(
        temp_dir.path().join("talk.srt"),
        vec![Segment::new(1, 1.0, 2.5, "Hello").with_translation("Bonjour")],
    );

    collection.write_to_srt(&output, CueTextMode::Dual)?;

    let written = std::fs::read_to_string(&output)?;
    assert_eq!(written, "1\n00:00:01,000 --> 00:00:02,500\nBonjour\nHello\n\n");
    Ok(())
}

#[test]
fn test_cueText_translationMode_withoutTranslation_shouldFallBackToSource() {
    let segment = Segment::new(1, 0.0, 1.0, "Untranslated");

    assert_eq!(segment.cue_text(CueTextMode::Translation), "Untranslated");
    assert_eq!(segment.cue_text(CueTextMode::Dual), "Untranslated");
}

#[test]
fn test_writeToJson_thenLoad_shouldKeepTranslations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("segments.json");
    let collection = SegmentCollection::new(
        path.clone(),
        vec![
            Segment::new(1, 0.0, 1.0, "One").with_translation("Un"),
            Segment::new(2, 1.0, 2.0, "Two").with_translation("Deux"),
        ],
    );

    collection.write_to_json(&path)?;
    let loaded = SegmentCollection::load(&path)?;

    assert_eq!(loaded.segments, collection.segments);
    Ok(())
}
