use std::time::Instant;

use tracing::info;

use fkseed_core::{Catalog, Discovery, RowWriter, RuleStore, discover};

use crate::errors::SeedError;
use crate::inserter::TopologicalInserter;
use crate::materializer::RowMaterializer;
use crate::model::{SeedOptions, SeedReport, TableReport};

/// Entry point for seeding target tables and their FK ancestors.
#[derive(Debug, Clone, Default)]
pub struct SeedEngine {
    options: SeedOptions,
}

impl SeedEngine {
    pub fn new(options: SeedOptions) -> Self {
        Self { options }
    }

    /// Discover the dependency graph without inserting anything.
    pub async fn plan<C>(
        &self,
        catalog: &C,
        targets: &[String],
        rules: RuleStore,
    ) -> Result<Discovery, SeedError>
    where
        C: Catalog + ?Sized,
    {
        Ok(discover(catalog, targets, rules).await?)
    }

    /// Discover the graph for `targets`, then insert one row per table.
    pub async fn run<C, W>(
        &self,
        catalog: &C,
        writer: &W,
        targets: &[String],
        rules: RuleStore,
    ) -> Result<SeedReport, SeedError>
    where
        C: Catalog + ?Sized,
        W: RowWriter + ?Sized,
    {
        let start = Instant::now();
        let run_id = self
            .options
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let seed = self.options.seed.unwrap_or_else(rand::random);
        let now = self
            .options
            .now
            .unwrap_or_else(|| chrono::Utc::now().naive_utc());

        info!(
            event = "seed_started",
            run_id = %run_id,
            targets = %targets.join(","),
            seed,
            "seeding started"
        );

        let Discovery { graph, rules } = self.plan(catalog, targets, rules).await?;
        info!(
            event = "graph_built",
            tables = graph.tables().len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );

        let inserter = TopologicalInserter::new(RowMaterializer::new(writer, &rules, seed, now));
        let rows = inserter.run(&graph).await?;

        let report = SeedReport {
            run_id,
            seed,
            insertion_order: rows.iter().map(|row| row.table.clone()).collect(),
            tables: rows.iter().map(TableReport::from_row).collect(),
            duration_ms: start.elapsed().as_millis() as u64,
            rules,
        };

        info!(
            event = "seed_finished",
            run_id = %report.run_id,
            tables = report.tables.len(),
            duration_ms = report.duration_ms,
            "seeding finished"
        );

        Ok(report)
    }
}
