mod common;

use cnpj_loader::ingestion::{IndexBuilder, IndexSpec};
use common::*;

#[tokio::test]
async fn test_four_indices_in_one_commit() {
    let sink = RecordingSink::new();
    let progress = RecordingProgress::default();

    IndexBuilder::default().build(&sink, &progress).await.unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 1, "a single committed transaction");

    let SinkEvent::Transaction(statements) = &events[0] else {
        panic!("expected a transaction, got {:?}", events[0]);
    };
    assert_eq!(statements.len(), 4);
    for (statement, table) in statements
        .iter()
        .zip(["empresa", "estabelecimento", "socios", "simples"])
    {
        assert!(statement.starts_with("CREATE INDEX"), "{}", statement);
        assert!(statement.contains(&format!("ON \"{}\"", table)), "{}", statement);
        assert!(statement.contains("(\"cnpj_basico\")"), "{}", statement);
    }

    assert_eq!(
        progress.events(),
        vec![
            ProgressEvent::IndicesStarted,
            ProgressEvent::IndicesFinished(vec![
                "empresa".to_string(),
                "estabelecimento".to_string(),
                "socios".to_string(),
                "simples".to_string(),
            ]),
        ]
    );
}

#[tokio::test]
async fn test_custom_index_list() {
    let sink = RecordingSink::new();
    let builder = IndexBuilder::new(vec![IndexSpec::new("cnae_codigo", "cnae", "codigo")]);

    builder.build(&sink, &cnpj_loader::ingestion::SilentProgress).await.unwrap();

    assert_eq!(
        sink.statements(),
        vec!["CREATE INDEX IF NOT EXISTS \"cnae_codigo\" ON \"cnae\" (\"codigo\")".to_string()]
    );
}
