//! Integration tests for the paragraph engine through the public API.
//!
//! All inputs are inline text, so these run offline and without pdfium.

use edgequake_paragraphs::{
    extract_paragraphs, format_records, ingest, parse_requested_numbers, write_output,
    ExtractionConfig, IngestConfig, NumberingPolicy, ParagraphError, ParagraphExtractor,
    ParagraphRecord,
};
use pretty_assertions::assert_eq;

// ── Fixtures ─────────────────────────────────────────────────────────────────

const SPANISH: &str = "1. Primera oración del párrafo uno.\n\
2. Segunda oración del párrafo dos que continúa\n\
en la siguiente línea.\n\
08-63561\n\
3. Tercer párrafo.";

/// Paragraph 2 is split across a page break with a footnote block between.
const REPORT: &str = "\
GE.08-63561 (S)
A. Introduction
1. The Committee met in Geneva to consider the report.
2. The State party reported on
__________________
1 Human Rights Council resolution 7/23.
2 Official Records of the General Assembly.
-4-
(S)
the measures adopted since the last review.
3. The Committee recalls its previous recommendations
12 See A/HRC/7/23, para. 4.
and welcomes the new legislation.
B. Concluding observations
Text under the heading is not part of paragraph 3.
4. The Committee urges the State party to act.
";

const GAPPED: &str = "1. Alpha text.\n2. Beta text.\n4. Delta text.\n5. Epsilon text.";

fn record(number: u32, text: &str) -> ParagraphRecord {
    ParagraphRecord {
        number,
        text: text.to_string(),
    }
}

/// Route debug logs from the pipeline into the test output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("edgequake_paragraphs=debug")
        .with_test_writer()
        .try_init();
}

fn numbers(records: &[ParagraphRecord]) -> Vec<u32> {
    records.iter().map(|r| r.number).collect()
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[test]
fn spanish_document_round() {
    let records = extract_paragraphs(SPANISH, &[1, 2, 3], NumberingPolicy::Permissive).unwrap();
    assert_eq!(
        records,
        vec![
            record(1, "Primera oración del párrafo uno."),
            record(
                2,
                "Segunda oración del párrafo dos que continúa en la siguiente línea."
            ),
            record(3, "Tercer párrafo."),
        ]
    );
    assert!(!records[1].text.contains("08-63561"));
}

#[test]
fn paragraph_spanning_a_footnote_block_and_page_break() {
    let records = extract_paragraphs(REPORT, &[2], NumberingPolicy::Permissive).unwrap();
    assert_eq!(
        records,
        vec![record(
            2,
            "The State party reported on the measures adopted since the last review."
        )]
    );
}

#[test]
fn footnote_block_text_appears_in_no_record() {
    init_tracing();
    let records = ParagraphExtractor::default().extract_all(REPORT);
    assert_eq!(numbers(&records), vec![1, 2, 3, 4]);
    for r in &records {
        assert!(!r.text.contains("Human Rights Council"), "{r:?}");
        assert!(!r.text.contains("Official Records"), "{r:?}");
        assert!(!r.text.contains("-4-"), "{r:?}");
    }
}

#[test]
fn citations_are_skipped_and_headings_end_paragraphs() {
    let records = extract_paragraphs(REPORT, &[3], NumberingPolicy::Permissive).unwrap();
    assert_eq!(
        records,
        vec![record(
            3,
            "The Committee recalls its previous recommendations and welcomes the new legislation."
        )]
    );
}

#[test]
fn paragraphs_mentioning_a_document_symbol_survive() {
    let text = "1. Primera.\n2. El informe 08-63561 fue\naprobado por el Consejo.\n3. Tercero.";
    let records = extract_paragraphs(text, &[2], NumberingPolicy::Permissive).unwrap();
    assert_eq!(
        records,
        vec![record(2, "El informe 08-63561 fue aprobado por el Consejo.")]
    );

    let text = "1. El Consejo examinó el documento\n\
        GE.08-63561 en su período de sesiones.\n2. Segundo.";
    let records = extract_paragraphs(text, &[1], NumberingPolicy::Permissive).unwrap();
    assert_eq!(
        records[0].text,
        "El Consejo examinó el documento GE.08-63561 en su período de sesiones."
    );
}

#[test]
fn footnote_block_ends_at_a_paragraph_that_cites_a_year() {
    let text = "\
1. First paragraph
__________________
3 Human Rights Council resolution 7/23.
2. In resolution 62/149 (2007), the Assembly called for a moratorium.
3. Third.";
    let records = extract_paragraphs(text, &[1, 2, 3], NumberingPolicy::Permissive).unwrap();
    assert_eq!(
        records,
        vec![
            record(1, "First paragraph"),
            record(2, "In resolution 62/149 (2007), the Assembly called for a moratorium."),
            record(3, "Third."),
        ]
    );
}

#[test]
fn policy_changes_which_numbers_are_found() {
    let permissive =
        extract_paragraphs(GAPPED, &[1, 2, 4, 5], NumberingPolicy::Permissive).unwrap();
    assert_eq!(numbers(&permissive), vec![1, 2, 4, 5]);
    assert_eq!(permissive[1].text, "Beta text.");

    let strict = extract_paragraphs(GAPPED, &[1, 2, 4, 5], NumberingPolicy::Strict).unwrap();
    assert_eq!(numbers(&strict), vec![1, 2]);
    // 4 and 5 are not paragraph starts under the strict policy, so they do
    // not end paragraph 2.
    assert_eq!(strict[1].text, "Beta text. 4. Delta text. 5. Epsilon text.");
}

#[test]
fn request_order_and_duplicates_are_kept() {
    let records = extract_paragraphs(SPANISH, &[3, 1, 3], NumberingPolicy::Permissive).unwrap();
    assert_eq!(numbers(&records), vec![3, 1, 3]);
    assert_eq!(records[0], records[2]);
}

#[test]
fn unknown_numbers_are_omitted() {
    let records = extract_paragraphs(SPANISH, &[2, 99], NumberingPolicy::Permissive).unwrap();
    assert_eq!(numbers(&records), vec![2]);

    let none =
        extract_paragraphs("No numbered lines here.", &[1], NumberingPolicy::Permissive).unwrap();
    assert!(none.is_empty());
}

#[test]
fn zero_is_rejected() {
    let err = extract_paragraphs(SPANISH, &[1, 0], NumberingPolicy::Permissive).unwrap_err();
    assert!(matches!(err, ParagraphError::InvalidRequest { .. }), "{err:?}");
}

#[test]
fn records_are_normalised_and_repeatable() {
    let extractor = ParagraphExtractor::default();
    let first = extractor.extract(REPORT, &[1, 2, 3, 4]).unwrap();
    let second = extractor.extract(REPORT, &[1, 2, 3, 4]).unwrap();
    assert_eq!(first, second);

    for r in &first {
        assert!(!r.text.contains('\n'), "{r:?}");
        assert!(!r.text.contains("  "), "{r:?}");
        assert_eq!(r.text, r.text.trim());
        assert!(!r.text.starts_with(&format!("{}.", r.number)), "{r:?}");
    }
}

#[test]
fn extract_all_follows_the_main_numbering() {
    let text =
        "1. First paragraph.\n2. Second paragraph.\n7. Stray numbered line.\n3. Third paragraph.";
    let records = ParagraphExtractor::default().extract_all(text);
    assert_eq!(numbers(&records), vec![1, 2, 3]);
}

// ── Configuration ────────────────────────────────────────────────────────────

#[test]
fn footnote_recovery_can_be_disabled() {
    let text = "\
5. The Council recalled its earlier decisions
7 Adopted by the Council in its resolution.
Official Records, Supplement No. 53.
and urged all States to cooperate.";

    let with_recovery = ParagraphExtractor::default().extract(text, &[5]).unwrap();
    assert_eq!(
        with_recovery[0].text,
        "The Council recalled its earlier decisions and urged all States to cooperate."
    );

    let config = ExtractionConfig::builder()
        .footnote_recovery(false)
        .build()
        .unwrap();
    let without = ParagraphExtractor::new(config).unwrap().extract(text, &[5]).unwrap();
    assert_eq!(
        without[0].text,
        "The Council recalled its earlier decisions Official Records, Supplement No. 53. \
         and urged all States to cooperate."
    );
}

#[test]
fn custom_citation_word_is_skipped() {
    let text = "1. Premier paragraphe\n4. Voir le rapport annuel.\nqui continue.";

    let default_strict = extract_paragraphs(text, &[1], NumberingPolicy::Strict).unwrap();
    assert_eq!(
        default_strict[0].text,
        "Premier paragraphe 4. Voir le rapport annuel. qui continue."
    );

    let config = ExtractionConfig::builder()
        .policy(NumberingPolicy::Strict)
        .add_citation_intro_word("Voir")
        .build()
        .unwrap();
    let custom = ParagraphExtractor::new(config).unwrap().extract(text, &[1]).unwrap();
    assert_eq!(custom[0].text, "Premier paragraphe qui continue.");
}

#[test]
fn rules_load_from_json() {
    let config = ExtractionConfig::from_json_str(r#"{"policy": "strict"}"#).unwrap();
    assert_eq!(config.policy, NumberingPolicy::Strict);
    assert!(config.footnote_recovery);

    let extractor = ParagraphExtractor::new(config).unwrap();
    assert_eq!(extractor.recognized_numbers(GAPPED).to_vec(), vec![1, 2]);

    assert!(ExtractionConfig::from_json_str(r#"{"rules": {"separator_min_run": 1}}"#).is_err());
}

// ── Request parsing and output ───────────────────────────────────────────────

#[test]
fn requested_numbers_from_cli_style_lists() {
    assert_eq!(parse_requested_numbers("3, 7-9 12").unwrap(), vec![3, 7, 8, 9, 12]);
    assert_eq!(parse_requested_numbers("[5, 5, 1]").unwrap(), vec![5, 5, 1]);
    assert!(parse_requested_numbers("").is_err());
    assert!(parse_requested_numbers("0").is_err());
    assert!(parse_requested_numbers("-3").is_err());
    assert!(parse_requested_numbers("9-2").is_err());
    assert!(parse_requested_numbers("two").is_err());
}

#[test]
fn records_render_as_numbered_blocks() {
    let records = extract_paragraphs(SPANISH, &[1, 3], NumberingPolicy::Permissive).unwrap();
    assert_eq!(
        format_records(&records),
        "1. Primera oración del párrafo uno.\n\n3. Tercer párrafo.\n"
    );
}

#[tokio::test]
async fn text_files_are_ingested_and_output_written() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.txt");
    tokio::fs::write(&input, SPANISH).await.unwrap();

    let document = ingest(input.to_str().unwrap(), &IngestConfig::default())
        .await
        .unwrap();
    assert_eq!(document.file_name, "report.txt");

    let records = ParagraphExtractor::default().extract(&document.text, &[2]).unwrap();
    let out = dir.path().join("out.txt");
    write_output(&out, &format_records(&records)).await.unwrap();

    let written = tokio::fs::read_to_string(&out).await.unwrap();
    assert_eq!(
        written,
        "2. Segunda oración del párrafo dos que continúa en la siguiente línea.\n"
    );
}

#[tokio::test]
async fn missing_input_file_is_reported() {
    let err = ingest("/definitely/not/here.txt", &IngestConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ParagraphError::FileNotFound { .. }), "{err:?}");
}
