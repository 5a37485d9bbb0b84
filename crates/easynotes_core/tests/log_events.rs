use easynotes_core::{
    title_slug, Article, Document, InMemoryDocumentRepository, NoteService, DEFAULT_ROOT_ID,
};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::Mutex;

struct RecordingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for RecordingLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: RecordingLogger = RecordingLogger {
    records: Mutex::new(Vec::new()),
};

// One test per binary: the logger is process-global.
#[test]
fn title_derived_ids_stay_below_info_level() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Debug);

    let title = "Medical history of Jane";
    let secret_id = title_slug(title);
    let missing_id = title_slug("Secret plans");

    let mut service = NoteService::open(InMemoryDocumentRepository::new()).unwrap();
    service
        .add_with_id(
            DEFAULT_ROOT_ID,
            secret_id.clone(),
            title,
            vec![Article::new("Allergies", "penicillin")],
        )
        .unwrap();
    let child = service.add(&secret_id, "Visits", Vec::new()).unwrap();
    service.move_note(&child.id, DEFAULT_ROOT_ID).unwrap();
    service.move_note(&child.id, &secret_id).unwrap();
    assert!(service.add(&missing_id, "Ghost", Vec::new()).is_err());
    assert!(service.remove_subtree(&missing_id).is_err());
    service.remove_subtree(&secret_id).unwrap();

    let mut corrupt = Document::default();
    corrupt.edges.insert(
        DEFAULT_ROOT_ID.to_string(),
        vec![secret_id.clone(), secret_id.clone()],
    );
    assert!(NoteService::open(InMemoryDocumentRepository::with_document(corrupt)).is_err());

    let records = LOGGER.records.lock().unwrap();
    for (level, line) in records.iter() {
        assert!(!line.contains(title), "title logged: {line}");
        assert!(!line.contains("penicillin"), "article text logged: {line}");
        if *level <= Level::Info {
            assert!(!line.contains(&secret_id), "id logged at {level}: {line}");
            assert!(!line.contains(&missing_id), "id logged at {level}: {line}");
        }
    }
    assert!(records
        .iter()
        .any(|(level, line)| *level == Level::Info && line.contains("event=note_add")));
    assert!(records
        .iter()
        .any(|(level, line)| *level == Level::Debug && line.contains(&secret_id)));
}
