use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use file_index_common::{init_logging, run_stamp, RunSummary, SystemConfig};
use file_index_indexing::{import_directory, index_name_from_run_dir, CatalogParser, DirectoryWalker};
use file_index_storage::{BatchSink, IndexSink, JsonFileSink, OpenSearchClient};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::Commands;

/// Lowercased base name of an input directory
pub fn input_name(path: &Path) -> Result<String> {
    let name = match path.file_name() {
        Some(name) => name.to_os_string(),
        None => std::fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?
            .file_name()
            .map(|n| n.to_os_string())
            .with_context(|| format!("{} has no directory name", path.display()))?,
    };
    Ok(name.to_string_lossy().to_lowercase())
}

/// `{output_dir}/{kind}_{input}_{stamp}`
pub fn run_directory(config: &SystemConfig, kind: &str, input: &str, stamp: &str) -> PathBuf {
    config.output.output_dir.join(format!("{}_{}_{}", kind, input, stamp))
}

async fn index_sink(config: &SystemConfig, index: &str, clear: bool) -> Result<IndexSink> {
    config.require_password()?;
    let client = OpenSearchClient::new(&config.opensearch)?;
    client
        .create_index(index, clear)
        .await
        .with_context(|| format!("Failed to create index {}", index))?;
    Ok(IndexSink::new(client, index))
}

async fn open_sink(
    config: &SystemConfig,
    run_dir: PathBuf,
    to_file: bool,
    index: &str,
    clear: bool,
) -> Result<Box<dyn BatchSink>> {
    if to_file {
        info!("Writing batches to {}", run_dir.display());
        Ok(Box::new(JsonFileSink::new(run_dir).await?))
    } else {
        info!("Pushing batches to index {}", index);
        Ok(Box::new(index_sink(config, index, clear).await?))
    }
}

fn require_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    Ok(())
}

fn report(kind: &str, summary: &RunSummary, started: Instant) {
    info!("####################################################################################");
    info!("Finished {} run after {:.2} seconds.", kind, started.elapsed().as_secs_f64());
    info!("  Processed {} files ({} failed) with {} records.", summary.files_processed, summary.files_failed, summary.records);
    info!("  {}", summary);
    info!("  {} flushes, {} with failures.", summary.flushes, summary.push_failures);
    if summary.faulty_rows > 0 {
        warn!("  Encountered {} unfixable faulty rows, please check the input files.", summary.faulty_rows);
    }
    if summary.push_failures > 0 {
        warn!("  {} batches were not stored completely, see the log for details.", summary.push_failures);
    }
}

pub async fn run(command: Commands, config: SystemConfig) -> Result<()> {
    let started = Instant::now();
    let now = Local::now();
    let stamp = run_stamp(now);
    let indexed = now.with_timezone(&Utc);
    let mut summary = RunSummary::default();

    match command {
        Commands::Directory {
            root,
            clear,
            to_file,
            index,
            hash,
        } => {
            require_directory(&root)?;
            let input = input_name(&root)?;
            let _log = init_logging(&config.output.log_dir, &format!("directory_{}", input), &stamp)?;
            info!("Walking {}", root.display());

            let index = index.unwrap_or_else(|| input.clone());
            let run_dir = run_directory(&config, "directory", &input, &stamp);
            let mut sink = open_sink(&config, run_dir, to_file, &index, clear).await?;

            let walker = DirectoryWalker::new(&root, &config.indexing, indexed)
                .with_hashing(hash || config.indexing.hash_contents);
            walker.walk(&root, sink.as_mut(), &mut summary).await?;

            report("directory", &summary, started);
        }

        Commands::Catalog {
            dir,
            clear,
            to_file,
            index,
        } => {
            require_directory(&dir)?;
            let input = input_name(&dir)?;
            let _log = init_logging(&config.output.log_dir, &format!("catalog_{}", input), &stamp)?;

            let index = index.unwrap_or_else(|| input.clone());
            let run_dir = run_directory(&config, "catalog", &input, &stamp);
            let mut sink = open_sink(&config, run_dir, to_file, &index, clear).await?;

            let parser = CatalogParser::new(&config, indexed);
            summary = parser.process_directory(&dir, sink.as_mut()).await?;

            report("catalog", &summary, started);
        }

        Commands::Import { dir, clear, index } => {
            require_directory(&dir)?;
            let index = match index {
                Some(index) => index,
                None => index_name_from_run_dir(&dir)
                    .with_context(|| format!("Cannot derive an index name from {}", dir.display()))?,
            };
            let _log = init_logging(&config.output.log_dir, &format!("{}_import", index), &stamp)?;

            let mut sink = index_sink(&config, &index, clear).await?;
            import_directory(&dir, &mut sink, &mut summary).await?;

            report("import", &summary, started);
        }

        Commands::Completions { shell } => crate::completions::generate(shell),
    }

    Ok(())
}
