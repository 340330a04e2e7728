mod common;

use common::{alignment, TestEnvironment};
use pretty_assertions::assert_eq;
use splace::SupermatrixBuilder;
use std::path::PathBuf;

fn two_gene_set(env: &TestEnvironment) -> Vec<PathBuf> {
    vec![
        env.write(
            "trimmed/COI_trimmed.fasta",
            &alignment(&[("A", "ACGTACGTAC"), ("B", "ACGTACGTAA")]),
        ),
        env.write(
            "trimmed/CYTB_trimmed.fasta",
            &alignment(&[("B", "GGGGCCCC"), ("C", "GGGGCCCA")]),
        ),
    ]
}

#[test]
fn test_two_gene_example() {
    let env = TestEnvironment::new();
    let files = two_gene_set(&env);

    let (matrix, partitions) = SupermatrixBuilder::new().build(&files).unwrap();

    assert_eq!(matrix.ntax(), 3);
    assert_eq!(matrix.nchar(), 18);
    assert_eq!(matrix.taxa().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    assert_eq!(matrix.row("A"), Some(&b"ACGTACGTAC--------"[..]));
    assert_eq!(matrix.row("B"), Some(&b"ACGTACGTAAGGGGCCCC"[..]));
    assert_eq!(matrix.row("C"), Some(&b"----------GGGGCCCA"[..]));

    let coi = partitions.get("COI").unwrap();
    let cytb = partitions.get("CYTB").unwrap();
    assert_eq!((coi.start, coi.end), (1, 10));
    assert_eq!((cytb.start, cytb.end), (11, 18));

    let nexus = matrix.to_nexus(&partitions);
    assert!(nexus.contains("DIMENSIONS NTAX=3 NCHAR=18;"));
    assert!(nexus.contains("    CHARSET COI = 1-10;\n    CHARSET CYTB = 11-18;\n"));
}

#[test]
fn test_output_is_independent_of_input_order() {
    let env = TestEnvironment::new();
    let mut files = two_gene_set(&env);
    files.push(env.write(
        "trimmed/ATP8_aligned_trimmed.fasta",
        &alignment(&[("D", "AAAT"), ("A", "AAAC")]),
    ));

    let forward = env.path("forward.nex");
    let reverse = env.path("reverse.nex");
    SupermatrixBuilder::new().build_to_file(&files, &forward).unwrap();
    files.reverse();
    SupermatrixBuilder::new().build_to_file(&files, &reverse).unwrap();

    let forward = std::fs::read(forward).unwrap();
    assert_eq!(forward, std::fs::read(reverse).unwrap());

    // ATP8 sorts first by file name
    let text = String::from_utf8(forward).unwrap();
    assert!(text.contains("CHARSET ATP8 = 1-4;"));
}

#[test]
fn test_rows_and_partitions_cover_every_column() {
    let env = TestEnvironment::new();
    let files = vec![
        env.write("t/ND1_trimmed.fasta", &alignment(&[("x", "ACG"), ("y", "ACC")])),
        env.write("t/ND2_trimmed.fasta", &alignment(&[("z", "TTTTT")])),
        env.write("t/ND3_trimmed.fasta", &alignment(&[("x", "GG"), ("z", "GA")])),
    ];

    let (matrix, partitions) = SupermatrixBuilder::new().build(&files).unwrap();
    let total = partitions.total_chars();
    assert_eq!(total, 10);
    assert_eq!(matrix.nchar(), total);

    let mut next = 1;
    for p in partitions.partitions() {
        assert_eq!(p.start, next);
        assert!(p.end >= p.start);
        next = p.end + 1;
    }
    assert_eq!(next, total + 1);

    for taxon in matrix.taxa() {
        assert_eq!(matrix.row(taxon).unwrap().len(), total);
    }
    // y only has ND1
    assert_eq!(matrix.row("y"), Some(&b"ACC-------"[..]));
}

#[test]
fn test_labels_with_spaces_are_quoted() {
    let env = TestEnvironment::new();
    let files = vec![env.write(
        "t/matK_trimmed.fasta",
        &alignment(&[("Arabidopsis thaliana NC_000932", "ATGC"), ("Oryza", "ATGG")]),
    )];

    let (matrix, partitions) = SupermatrixBuilder::new().build(&files).unwrap();
    let nexus = matrix.to_nexus(&partitions);
    assert!(nexus.contains("'Arabidopsis thaliana NC_000932' ATGC\n"));
    assert!(nexus.contains("'Oryza'"));
}
