use crate::genes::{GeneNameResolver, OrganelleType, SynonymNormalizer};
use clap::Args;
use colored::*;
use std::path::Path;
use std::sync::Arc;

#[derive(Args)]
pub struct GenesArgs {
    /// Organelle marker set [default: from config, else mt]
    #[arg(short = 'd', long, value_enum)]
    pub data_type: Option<OrganelleType>,

    /// Show what this gene/product label resolves to
    #[arg(long, value_name = "TEXT")]
    pub resolve: Option<String>,
}

pub fn run(args: GenesArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::base_config(config_path)?;
    let organelle = args.data_type.unwrap_or(config.pipeline.data_type);
    let normalizer = SynonymNormalizer::new().with_synonyms(config.genes.synonyms);
    let resolver = GeneNameResolver::new(organelle, Arc::new(normalizer));

    match args.resolve {
        Some(text) => {
            let resolved = resolver
                .resolve(&text)
                .or_else(|| resolver.resolve_header(&text));
            match resolved {
                Some(symbol) => println!("{} -> {}", text, symbol.green().bold()),
                None => println!("{} -> {}", text, "unresolved".red()),
            }
        }
        None => {
            println!("{} ({})", "Marker genes".bold(), organelle);
            for gene in resolver.vocabulary().genes() {
                println!("  {}", gene);
            }
        }
    }
    Ok(())
}
