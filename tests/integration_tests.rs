// End-to-end deconvolution evaluation workflow on small files written to a temporary
// directory: load, harmonize, select, normalize, derive gene sets, score estimates.

#[cfg(test)]
mod integration_tests {
    use approx::assert_abs_diff_eq;
    use decon_utils::correlation::{
        GROUND_TRUTH, correlation_table, flatten_per_cell, paired_predictions_long,
        summarize_correlation,
    };
    use decon_utils::genesets::{UpDownCutoffs, derive_up_down_genes};
    use decon_utils::io::{
        TAB, read_columnar_gene_sets, read_expression_table, read_labeled_table,
        read_named_gene_sets, read_signature_table, write_columnar_gene_sets,
        write_paired_predictions, write_table,
    };
    use decon_utils::table::GeneIdentifier;
    use decon_utils::transform::{Scaling, intersect_by_index, normalize, select_by_variance};
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const EXPRESSION: &str = "Hugo_Symbol\tEntrez_Gene_Id\tP1\tP2\tP3\tP4\n\
        CD3E\t916\t30\t10\t5\t20\n\
        CD19\t930\t4\t25\t6\t12\n\
        NCAM1\t4684\t2\t3\t40\t9\n\
        ACTB\t60\t500\t500\t500\t500\n\
        GAPDH\t2597\t200\t201\t\t199\n";

    const SIGNATURE: &str = "Gene\tT cells\tB cells\tNK cells\n\
        CD19\t1\t60\t2\n\
        CD3E\t50\t1\t3\n\
        NCAM1\t2\t1\t45\n\
        ACTB\t300\t300\t300\n\
        MS4A1\t0.5\t30\t0.5\n";

    const TRUTH: &str = "sample\tT cells\tB cells\tNK cells\n\
        P1\t0.6\t0.2\t0.2\n\
        P2\t0.2\t0.6\t0.2\n\
        P3\t0.1\t0.2\t0.7\n\
        P4\t0.4\t0.4\t0.2\n";

    const ESTIMATE: &str = "sample\tNK cells\tT cells\tB cells\n\
        P4\t0.15\t0.45\t0.4\n\
        P3\t0.65\t0.15\t0.2\n\
        P2\t0.25\t0.15\t0.6\n\
        P1\t0.2\t0.55\t0.25\n";

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_expression_signature_pipeline() {
        let dir = TempDir::new().unwrap();
        let rna_path = write_file(dir.path(), "rna.tsv", EXPRESSION);
        let sig_path = write_file(dir.path(), "lm.tsv", SIGNATURE);

        let rna = read_expression_table(&rna_path, GeneIdentifier::Hugo).unwrap();
        let sig = read_signature_table(&sig_path).unwrap();
        assert_eq!(rna.nrows(), 5);
        assert_eq!(sig.index_name(), "Hugo_Symbol");

        let (rna, sig) = intersect_by_index(&rna, &sig).unwrap();
        assert_eq!(rna.row_labels(), &["ACTB", "CD19", "CD3E", "NCAM1"]);
        assert_eq!(rna.row_labels(), sig.row_labels());

        // ACTB is constant across samples
        let rna = select_by_variance(&rna, 0.5).unwrap();
        assert_eq!(rna.row_labels(), &["CD19", "CD3E", "NCAM1"]);

        let rna = normalize(&rna, Scaling::MinMax, 1).unwrap();
        for row in rna.values().rows() {
            assert!(row.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
        assert_eq!(rna.get("NCAM1", "P3"), Some(1.0));
        assert_eq!(rna.get("NCAM1", "P1"), Some(0.0));

        let out = dir.path().join("rna_norm.tsv");
        write_table(&rna, &out, TAB).unwrap();
        let reloaded = read_labeled_table(&out, TAB).unwrap();
        assert_eq!(reloaded.row_labels(), rna.row_labels());
        assert_eq!(reloaded.index_name(), "Hugo_Symbol");
    }

    #[test]
    fn test_gene_set_derivation_round_trip() {
        let dir = TempDir::new().unwrap();
        let sig_path = write_file(dir.path(), "lm.tsv", SIGNATURE);
        let sig = read_signature_table(&sig_path).unwrap();

        let (up, down) = derive_up_down_genes(&sig, UpDownCutoffs::default()).unwrap();
        assert_eq!(up.get("B cells").unwrap(), &["CD19", "MS4A1"]);
        assert_eq!(up.get("T cells").unwrap(), &["CD3E"]);
        assert_eq!(up.get("NK cells").unwrap(), &["NCAM1"]);
        // CD3E median 3: 1/3 in B cells
        assert_eq!(down.get("B cells").unwrap(), &["CD3E"]);
        assert!(down.get("T cells").unwrap().is_empty());

        let up_path = dir.path().join("up.csv");
        write_columnar_gene_sets(&up, &up_path).unwrap();
        assert_eq!(read_columnar_gene_sets(&up_path).unwrap(), up);

        let named = write_file(
            dir.path(),
            "sets.csv",
            "Cell type,Symbol\nB cells,CD19\nB cells,MS4A1\nT cells,CD3E\n",
        );
        let sets = read_named_gene_sets(&named, "Cell type", "Symbol").unwrap();
        assert_eq!(sets.get("B cells"), up.get("B cells"));
    }

    #[test]
    fn test_correlation_report_workflow() {
        let dir = TempDir::new().unwrap();
        let truth = read_labeled_table(write_file(dir.path(), "truth.tsv", TRUTH), TAB).unwrap();
        let estimate =
            read_labeled_table(write_file(dir.path(), "est.tsv", ESTIMATE), TAB).unwrap();

        let methods = vec!["method_a".to_string(), "oracle".to_string()];
        let mut results = HashMap::new();
        results.insert("method_a".to_string(), estimate.clone());
        results.insert("oracle".to_string(), truth.clone());
        let categories = truth.col_labels().to_vec();

        let report = correlation_table(&methods, &results, &categories, &truth).unwrap();
        assert_eq!(report.pearson_per_cell.row_labels(), categories.as_slice());
        assert_eq!(report.pearson_per_sample.row_labels(), truth.row_labels());
        for c in 0..categories.len() {
            assert_abs_diff_eq!(report.pearson_per_cell.values()[[c, 1]], 1.0, epsilon = 1e-12);
            let r = report.spearman_per_cell.values()[[c, 0]];
            assert!((0.0..=1.0).contains(&r));
        }

        let summary =
            summarize_correlation(&report.pearson_per_cell, &report.pearson_per_sample).unwrap();
        assert_eq!(summary[1].method, "oracle");
        assert_abs_diff_eq!(summary[1].mean_corr_per_cell, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary[1].std_corr_per_cell, 0.0, epsilon = 1e-12);
        assert!(summary[0].mean_corr_per_cell < 1.0);

        let flat = flatten_per_cell(&report.pearson_per_cell);
        assert_eq!(flat.len(), methods.len() * categories.len());
        assert_eq!(flat[0].method, "method_a");
        assert_eq!(flat[3].method, "oracle");

        let paired = paired_predictions_long("method_a", &estimate, &truth, &categories).unwrap();
        assert_eq!(paired.len(), 12);
        assert_eq!(paired.rows[0].sample, "P1");
        assert_eq!(paired.rows[0].category, "T cells");
        assert_abs_diff_eq!(paired.rows[0].estimate, 0.55);
        assert_abs_diff_eq!(paired.rows[0].truth, 0.6);

        let out = dir.path().join("paired.csv");
        write_paired_predictions(&paired, &out).unwrap();
        let header = fs::read_to_string(&out).unwrap();
        assert_eq!(
            header.lines().next().unwrap(),
            format!("Sample,method_a,{},Cell type", GROUND_TRUTH)
        );
    }
}
