use buffer_core::{Document, DocumentError, Position, Range, UndoRedoManager};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PIECES: &[&str] = &["", "x", "hello", "\n", "a\nb", "\n\n", "tail\r\n", "é✓", "\tindent"];

fn random_position(rng: &mut StdRng, doc: &Document) -> Position {
    let line = rng.gen_range(0..doc.line_count());
    let len = doc.line(line).unwrap().len();
    Position::new(line, rng.gen_range(0..=len))
}

fn random_range(rng: &mut StdRng, doc: &Document) -> Range {
    let a = random_position(rng, doc);
    let b = random_position(rng, doc);
    Range::safe_create(a, b)
}

fn normalized(text: &str, tab_width: usize) -> String {
    text.replace("\r\n", "\n").replace('\t', &" ".repeat(tab_width))
}

#[test]
fn test_inserted_range_holds_inserted_text() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut doc = Document::new();
    doc.set_text(["first line", "second", "", "fourth line here"]);

    for _ in 0..500 {
        let range = random_range(&mut rng, &doc);
        let text = PIECES[rng.gen_range(0..PIECES.len())];
        let expected_removed = doc.get_text(range).unwrap();

        let edit = doc.replace_content(range, text).unwrap();
        assert_eq!(edit.removed_text, expected_removed);
        assert_eq!(edit.inserted_range.begin(), range.begin());
        assert_eq!(
            doc.get_text(edit.inserted_range).unwrap(),
            normalized(text, doc.tab_width())
        );
        for i in 0..doc.line_count() {
            assert_eq!(doc.line(i).unwrap().index(), i);
        }
    }
}

#[test]
fn test_undo_restores_every_edit() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut doc = Document::new();
    doc.set_text(["fn main() {", "    body();", "}"]);
    let mut history = UndoRedoManager::default();

    for _ in 0..200 {
        let before = doc.full_text();
        let range = random_range(&mut rng, &doc);
        let text = PIECES[rng.gen_range(0..PIECES.len())];
        history.record(doc.replace_content(range, text).unwrap());
        let after = doc.full_text();

        history.undo(&mut doc).unwrap();
        assert_eq!(doc.full_text(), before);
        history.redo(&mut doc).unwrap();
        assert_eq!(doc.full_text(), after);
    }
}

#[test]
fn test_out_of_bounds_requests_are_rejected() {
    let mut doc = Document::new();
    doc.set_text(["abc", "de"]);

    let past_line = Position::new(2, 0).to_empty_range();
    assert!(matches!(
        doc.replace_content(past_line, "x"),
        Err(DocumentError::LineOutOfBounds {
            line: 2,
            line_count: 2
        })
    ));

    let past_offset = Range::new(Position::new(0, 1), Position::new(1, 3));
    assert!(matches!(
        doc.get_text(past_offset),
        Err(DocumentError::OffsetOutOfBounds { line_len: 2, .. })
    ));
    assert_eq!(doc.full_text(), "abc\nde");
}

#[test]
fn test_text_dimension_tracks_longest_line() {
    let mut doc = Document::with_tab_width(2);
    doc.set_text(["\tx", "abcdef"]);
    assert_eq!(doc.text_dimension(), (6, 2));
    assert_eq!(&*doc.line(0).unwrap().text(), "  x");

    doc.replace_content(Position::new(0, 3).to_empty_range(), "12345678")
        .unwrap();
    assert_eq!(doc.text_dimension(), (11, 2));
}
