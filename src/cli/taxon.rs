use anyhow::Context;
use clap::Args;

use crate::clients::worms::{RankLookup, WormsClient};
use crate::clients::{HttpTransport, RetryPolicy};

#[derive(Args)]
pub struct TaxonArgs {
    /// Scientific name to resolve
    #[arg(required = true)]
    pub name: String,

    /// Print the value of one taxonomic rank (e.g. Family)
    #[arg(long)]
    pub rank: Option<String>,

    /// Print the recorded synonyms instead of the classification
    #[arg(long, conflicts_with = "rank")]
    pub synonyms: bool,
}

/// Execute the taxon subcommand
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or WoRMS keeps
/// failing past the retry budget. An unresolvable name is reported as plain
/// output, not an error.
pub fn run(args: TaxonArgs, quiet: bool) -> anyhow::Result<()> {
    let transport = HttpTransport::new().context("could not build HTTP client")?;
    let client = WormsClient::new(&transport, RetryPolicy::default());

    let Some(taxon) = client.resolve(&args.name)? else {
        println!("{}: no WoRMS record found; check the spelling", args.name);
        return Ok(());
    };

    if !quiet {
        eprintln!(
            "Resolved {} to AphiaID {}",
            taxon.scientific_name, taxon.aphia_id
        );
    }

    if args.synonyms {
        let synonyms = client.synonyms(taxon.aphia_id)?;
        if synonyms.is_empty() {
            println!("No synonyms recorded for {}", taxon.scientific_name);
        } else {
            for name in synonyms {
                println!("{name}");
            }
        }
        return Ok(());
    }

    let classification = client.classification(taxon.aphia_id)?;

    match args.rank {
        Some(rank) => match classification.rank(&rank) {
            RankLookup::Found(name) => println!("{rank}\t{name}"),
            RankLookup::Unassigned => println!("{rank}\tunassigned"),
            RankLookup::RankNotFound => {
                println!("{rank}: not present in the classification; check the spelling");
            }
            RankLookup::TaxonUnresolved => {
                println!("{}: classification unavailable", args.name);
            }
        },
        None => {
            for level in classification.levels() {
                println!("{}\t{}", level.rank, level.scientific_name);
            }
        }
    }

    Ok(())
}
