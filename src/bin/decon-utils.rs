use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use decon_utils::correlation::{
    correlation_table, flatten_per_cell, summarize_correlation, summary_table,
};
use decon_utils::genesets::{UpDownCutoffs, derive_up_down_genes, top_ranked_genes};
use decon_utils::io::{
    COMMA, TAB, read_expression_table, read_labeled_table, read_signature_table,
    write_columnar_gene_sets, write_correlation_records, write_table,
};
use decon_utils::table::{GeneIdentifier, ProportionTable};
use decon_utils::transform::{Scaling, intersect_by_index, normalize, select_by_variance};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "decon-utils")]
#[command(about = "Data utilities for bulk RNA-seq deconvolution workflows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Restrict an expression and a signature matrix to their shared genes
    CommonGenes(CommonGenesArgs),
    /// Z-score or min-max normalize a table
    Normalize(NormalizeArgs),
    /// Drop genes whose variance does not exceed a threshold
    VarianceFilter(VarianceFilterArgs),
    /// Derive up- and down-regulated genes per cell type from a signature matrix
    UpDown(UpDownArgs),
    /// Keep the most expressed genes per cell type of a signature matrix
    TopGenes(TopGenesArgs),
    /// Correlate estimated proportions of several methods with the ground truth
    Correlate(CorrelateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IdentifierArg {
    Hugo,
    Entrez,
}

impl From<IdentifierArg> for GeneIdentifier {
    fn from(arg: IdentifierArg) -> Self {
        match arg {
            IdentifierArg::Hugo => GeneIdentifier::Hugo,
            IdentifierArg::Entrez => GeneIdentifier::Entrez,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScalingArg {
    Zscore,
    Minmax,
}

impl From<ScalingArg> for Scaling {
    fn from(arg: ScalingArg) -> Self {
        match arg {
            ScalingArg::Zscore => Scaling::ZScore,
            ScalingArg::Minmax => Scaling::MinMax,
        }
    }
}

#[derive(Args, Debug)]
struct CommonGenesArgs {
    #[arg(long, help = "Expression matrix (TSV, genes x samples)")]
    expression: PathBuf,

    #[arg(long, help = "Signature matrix (TSV, genes x cell types)")]
    signature: PathBuf,

    #[arg(long, value_enum, default_value = "hugo")]
    identifier: IdentifierArg,

    #[arg(long)]
    out_expression: PathBuf,

    #[arg(long)]
    out_signature: PathBuf,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    #[arg(short, long, help = "Table with row labels in the first column (TSV)")]
    input: PathBuf,

    #[arg(short, long, value_enum)]
    method: ScalingArg,

    #[arg(long, default_value = "0", help = "0 normalizes columns, 1 normalizes rows")]
    axis: usize,

    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct VarianceFilterArgs {
    #[arg(short, long, help = "Table with genes as rows (TSV)")]
    input: PathBuf,

    #[arg(long, default_value_t = decon_utils::transform::DEFAULT_VARIANCE_THRESHOLD)]
    threshold: f64,

    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct UpDownArgs {
    #[arg(short, long, help = "Signature matrix (TSV, genes x cell types)")]
    signature: PathBuf,

    #[arg(long, default_value_t = UpDownCutoffs::default().down)]
    down: f64,

    #[arg(long, default_value_t = UpDownCutoffs::default().up)]
    up: f64,

    #[arg(long, help = "Up-regulated gene sets (CSV, one column per cell type)")]
    out_up: PathBuf,

    #[arg(long, help = "Down-regulated gene sets (CSV, one column per cell type)")]
    out_down: PathBuf,
}

#[derive(Args, Debug)]
struct TopGenesArgs {
    #[arg(short, long, help = "Signature matrix (TSV, genes x cell types)")]
    signature: PathBuf,

    #[arg(long, default_value_t = decon_utils::genesets::DEFAULT_TOP_GENES)]
    size: usize,

    #[arg(short, long, help = "Gene sets (CSV, one column per cell type)")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct CorrelateArgs {
    #[arg(long, help = "True proportions (TSV, samples x cell types)")]
    truth: PathBuf,

    #[arg(
        long = "method",
        value_parser = parse_method,
        required = true,
        help = "Estimated proportions as NAME=PATH (TSV, samples x cell types); repeatable"
    )]
    methods: Vec<(String, PathBuf)>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Cell types to evaluate (default: every ground-truth column)"
    )]
    categories: Vec<String>,

    #[arg(
        long,
        help = "Output prefix (creates {prefix}.pearson_per_cell.csv, {prefix}.summary.csv, etc.)"
    )]
    out_prefix: String,
}

fn parse_method(raw: &str) -> std::result::Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{}'", raw)),
    }
}

fn output_path(prefix: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", prefix, suffix))
}

fn common_genes(args: &CommonGenesArgs) -> Result<()> {
    let expression = read_expression_table(&args.expression, args.identifier.into())?;
    let signature = read_signature_table(&args.signature)?;
    let (expression, signature) = intersect_by_index(&expression, &signature)?;
    info!("{} shared genes", expression.nrows());

    write_table(&expression, &args.out_expression, TAB)?;
    write_table(&signature, &args.out_signature, TAB)?;
    Ok(())
}

fn normalize_table(args: &NormalizeArgs) -> Result<()> {
    let table = read_labeled_table(&args.input, TAB)?;
    let normalized = normalize(&table, args.method.into(), args.axis)?;
    write_table(&normalized, &args.out, TAB)?;
    info!("normalized {}x{} table", normalized.nrows(), normalized.ncols());
    Ok(())
}

fn variance_filter(args: &VarianceFilterArgs) -> Result<()> {
    let table = read_labeled_table(&args.input, TAB)?;
    let selected = select_by_variance(&table, args.threshold)?;
    info!("kept {} of {} genes", selected.nrows(), table.nrows());
    write_table(&selected, &args.out, TAB)?;
    Ok(())
}

fn up_down(args: &UpDownArgs) -> Result<()> {
    let signature = read_signature_table(&args.signature)?;
    let (up, down) = derive_up_down_genes(&signature, UpDownCutoffs::new(args.down, args.up))?;
    write_columnar_gene_sets(&up, &args.out_up)?;
    write_columnar_gene_sets(&down, &args.out_down)?;
    info!("wrote up/down gene sets for {} cell types", up.len());
    Ok(())
}

fn top_genes(args: &TopGenesArgs) -> Result<()> {
    let signature = read_signature_table(&args.signature)?;
    let top = top_ranked_genes(&signature, args.size);
    write_columnar_gene_sets(&top, &args.out)?;
    info!("wrote top {} genes for {} cell types", args.size, top.len());
    Ok(())
}

fn load_results(methods: &[(String, PathBuf)]) -> Result<HashMap<String, ProportionTable>> {
    let mut results = HashMap::with_capacity(methods.len());
    for (name, path) in methods {
        results.insert(name.clone(), read_proportions(path)?);
    }
    Ok(results)
}

fn read_proportions(path: &Path) -> Result<ProportionTable> {
    read_labeled_table(path, TAB)
}

fn correlate(args: &CorrelateArgs) -> Result<()> {
    let truth = read_proportions(&args.truth)?;
    let results = load_results(&args.methods)?;
    let methods: Vec<String> = args.methods.iter().map(|(name, _)| name.clone()).collect();
    let categories = if args.categories.is_empty() {
        truth.col_labels().to_vec()
    } else {
        args.categories.clone()
    };

    let report = correlation_table(&methods, &results, &categories, &truth)?;
    let prefix = args.out_prefix.as_str();
    let tables = [
        (&report.pearson_per_cell, "pearson_per_cell.csv"),
        (&report.pearson_per_sample, "pearson_per_sample.csv"),
        (&report.spearman_per_cell, "spearman_per_cell.csv"),
        (&report.spearman_per_sample, "spearman_per_sample.csv"),
    ];
    for (table, suffix) in tables {
        write_table(table, output_path(prefix, suffix), COMMA)?;
    }

    let summary = summarize_correlation(&report.pearson_per_cell, &report.pearson_per_sample)?;
    write_table(&summary_table(&summary)?, output_path(prefix, "summary.csv"), COMMA)?;
    write_correlation_records(
        &flatten_per_cell(&report.pearson_per_cell),
        output_path(prefix, "pearson_per_cell_long.csv"),
    )?;

    for s in &summary {
        info!(
            "{}: mean per-sample r = {:.3}, mean per-cell r = {:.3}",
            s.method, s.mean_corr_per_sample, s.mean_corr_per_cell
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::CommonGenes(args) => common_genes(args)?,
        Commands::Normalize(args) => normalize_table(args)?,
        Commands::VarianceFilter(args) => variance_filter(args)?,
        Commands::UpDown(args) => up_down(args)?,
        Commands::TopGenes(args) => top_genes(args)?,
        Commands::Correlate(args) => correlate(args)?,
    }

    Ok(())
}
