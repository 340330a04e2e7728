mod common;

use common::{TestEnvironment, MITO_GENBANK};
use splace::bio::fasta::parse_fasta;
use splace::genes::{GeneNameResolver, OrganelleType};
use splace::processing::extractor::touched_files;
use splace::processing::MarkerExtractor;
use splace::StageRunner;
use std::sync::Arc;

fn extractor(env: &TestEnvironment, organelle: OrganelleType) -> MarkerExtractor {
    MarkerExtractor::new(
        Arc::new(GeneNameResolver::with_default_normalizer(organelle)),
        env.path("markers"),
    )
}

#[tokio::test]
async fn test_fasta_and_genbank_inputs_share_gene_files() {
    let env = TestEnvironment::new();
    let genbank = env.write("input/testus.gb", MITO_GENBANK);
    let fasta = env.write(
        "input/Alius_primus.fasta",
        ">a1 [gene=CO1] [protein=cytochrome c oxidase subunit I]\nATGGCACCA\n\
         >a2 cob cytochrome b 10:18 forward\nCCCGGGTTA\n\
         >a3 [gene=rrnS] [protein=12S ribosomal RNA]\nAAAA\n",
    );

    let runner = StageRunner::new("extraction", 4);
    let outcome = extractor(&env, OrganelleType::Mitochondrial)
        .extract_all(vec![fasta, genbank], &runner)
        .await;
    assert_eq!(outcome.failed(), 0);

    let markers = touched_files(&outcome.successes);
    assert_eq!(
        markers,
        vec![env.path("markers/COI.fasta"), env.path("markers/CYTB.fasta")]
    );

    let mut coi: Vec<String> = parse_fasta(env.path("markers/COI.fasta"))
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    coi.sort();
    assert_eq!(coi, vec!["Alius_primus", "Testus_exemplaris_NC_000001"]);

    let unresolved: usize = outcome.successes.iter().map(|e| e.unresolved).sum();
    assert_eq!(unresolved, 1);
}

#[tokio::test]
async fn test_unreadable_file_does_not_stop_the_batch() {
    let env = TestEnvironment::new();
    let good = env.write("input/Beta.fa", ">b [gene=matK]\nATGCATGC\n");
    let broken = env.write("input/Broken.fasta", "this is not fasta\n");
    let missing = env.path("input/Nope.fasta");

    let runner = StageRunner::new("extraction", 2);
    let outcome = extractor(&env, OrganelleType::Chloroplast)
        .extract_all(vec![good, broken, missing], &runner)
        .await;

    // the malformed file still opens; its bad record is counted, not fatal
    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(outcome.failed(), 1);
    assert_eq!(
        touched_files(&outcome.successes),
        vec![env.path("markers/matK.fasta")]
    );
    let malformed: usize = outcome.successes.iter().map(|e| e.malformed).sum();
    assert!(malformed >= 1);
}

#[tokio::test]
async fn test_normalizer_is_consulted_once_per_label() {
    let env = TestEnvironment::new();
    let files: Vec<_> = (0..6)
        .map(|i| {
            env.write(
                &format!("input/taxon{}.fasta", i),
                ">x [gene=maturase K]\nATGC\n",
            )
        })
        .collect();

    let extractor = extractor(&env, OrganelleType::Chloroplast);
    let runner = StageRunner::new("extraction", 1);
    let outcome = extractor.extract_all(files, &runner).await;

    assert_eq!(outcome.succeeded(), 6);
    assert_eq!(extractor.resolver().normalizer_calls(), 1);
    assert_eq!(parse_fasta(env.path("markers/matK.fasta")).unwrap().len(), 6);
}
