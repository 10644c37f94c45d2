use clap::Parser;
use s3_controller::config::cli::{Command, FrameOutput, RelocateArgs};
use s3_controller::core::scanner::scan_files_including_regex;
use s3_controller::core::special_operations::{merge_timeseries_csv_files, MenuDatasetRequest, MergeOptions};
use s3_controller::utils::error::ErrorSeverity;
use s3_controller::utils::{logger, validation::Validate};
use s3_controller::{
    Backend, CliConfig, ControllerConfig, ControllerError, DataFrame, LocalObjectStore, ObjectStore,
    RelocateMode, Result, S3Controller,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // Logs go to stderr so stdout stays pipeable.
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI arguments: {:?}", cli);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config).await {
        exit_with(&e);
    }
}

fn exit_with(e: &ControllerError) -> ! {
    tracing::error!(
        "❌ Operation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

async fn build_store(config: &ControllerConfig) -> Result<Box<dyn ObjectStore>> {
    match config.connection.backend {
        Backend::Local => {
            let root = config.local_root()?;
            tracing::debug!("Using local backend rooted at {}", root);
            Ok(Box::new(LocalObjectStore::new(root)))
        }
        #[cfg(feature = "s3")]
        Backend::S3 => {
            let store = s3_controller::S3ObjectStore::connect(&config.connection).await;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "s3"))]
        Backend::S3 => Err(ControllerError::ConfigError {
            message: "This binary was built without the 's3' feature".to_string(),
        }),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn run(command: Command, config: ControllerConfig) -> Result<()> {
    // Local-only commands never touch a store.
    match command {
        Command::ShowConfig => {
            let rendered = toml::to_string_pretty(&config).map_err(|e| ControllerError::ConfigError {
                message: format!("Failed to render configuration: {}", e),
            })?;
            println!("{}", rendered);
            return Ok(());
        }
        Command::ScanLocal {
            folder,
            regex,
            option,
        } => {
            for entry in scan_files_including_regex(&folder, &regex, option)? {
                println!("{}", entry);
            }
            return Ok(());
        }
        Command::MergeTimeseries {
            old,
            new,
            file_name_save,
            file_folder_save,
        } => {
            let options = MergeOptions {
                file_name_save,
                file_folder_save,
                date_column: config.special.date_column.clone(),
            };
            let outcome = merge_timeseries_csv_files(&old, &new, &options, today())?;
            println!(
                "✅ Merged {} new rows ({} total) into {}",
                outcome.appended_rows,
                outcome.frame.shape().0,
                outcome.saved_to.display()
            );
            return Ok(());
        }
        _ => {}
    }

    let store = build_store(&config).await?;
    let controller = S3Controller::with_special_config(store, config.special.clone());

    match command {
        Command::Scan { target, option } => {
            let entries = controller
                .scan(&target.bucket, &target.prefix, &target.regex, option)
                .await?;
            for entry in entries {
                println!("{}", entry);
            }
        }
        Command::Download {
            target,
            local_folder,
            local_subfolder,
        } => {
            let saved = controller
                .download(
                    &target.bucket,
                    &target.regex,
                    &local_folder,
                    &target.prefix,
                    local_subfolder.as_deref(),
                )
                .await?;
            for path in &saved {
                println!("{}", path.display());
            }
            println!("✅ Downloaded {} files", saved.len());
        }
        Command::Upload {
            local_folder,
            local_subfolder,
            regex,
            bucket,
            prefix,
        } => {
            let keys = controller
                .upload(
                    &local_folder,
                    &regex,
                    &bucket,
                    prefix.as_deref(),
                    local_subfolder.as_deref(),
                )
                .await?;
            for key in &keys {
                println!("s3://{}/{}", bucket, key);
            }
            println!("✅ Uploaded {} files", keys.len());
        }
        Command::Copy(args) => relocate(&controller, args, RelocateMode::Copy).await?,
        Command::Move(args) => relocate(&controller, args, RelocateMode::Move).await?,
        Command::ReadCsv {
            bucket,
            prefix,
            file_name,
            key,
            regex,
            index,
            output,
        } => {
            let df = match regex {
                Some(regex) => {
                    controller
                        .read_csv_by_regex(&bucket, prefix.as_deref().unwrap_or(""), &regex, index)
                        .await?
                }
                None => {
                    controller
                        .read_csv(&bucket, prefix.as_deref(), file_name.as_deref(), key.as_deref())
                        .await?
                }
            };
            print_frame(&df, &output)?;
        }
        Command::ReadExcel {
            bucket,
            prefix,
            file_name,
            regex,
            output,
        } => {
            let df = match (regex, file_name) {
                (Some(regex), _) => controller.read_excel_by_regex(&bucket, &prefix, &regex).await?,
                (None, Some(name)) => controller.read_excel(&bucket, &prefix, &name).await?,
                (None, None) => {
                    return Err(ControllerError::InvalidArgument {
                        message: "Either --file-name or --regex must be provided".to_string(),
                    })
                }
            };
            print_frame(&df, &output)?;
        }
        Command::Mkdir { bucket, subfolder } => {
            let key = controller.create_subfolder(&bucket, &subfolder).await?;
            println!("✅ Subfolder '{}' created in bucket '{}'", key, bucket);
        }
        Command::LocateMenu {
            menu_code,
            start_date,
            end_date,
            save_date,
            local_folder,
        } => {
            let request = MenuDatasetRequest {
                menu_code,
                start_date,
                end_date,
                save_date,
            };
            let saved = controller
                .locate_menu_datasets(&request, today(), &local_folder)
                .await?;
            for path in &saved {
                println!("{}", path.display());
            }
            println!("✅ Located {} dataset files", saved.len());
        }
        Command::ShowConfig | Command::ScanLocal { .. } | Command::MergeTimeseries { .. } => {}
    }

    Ok(())
}

async fn relocate(
    controller: &S3Controller<dyn ObjectStore>,
    args: RelocateArgs,
    mode: RelocateMode,
) -> Result<()> {
    let report = controller
        .relocate(
            &args.source_bucket,
            &args.target_bucket,
            &args.regex,
            &args.source_prefix,
            &args.target_prefix,
            mode,
        )
        .await?;

    for (source, target) in &report.relocated {
        println!("{} -> {}", source, target);
    }
    println!("✅ {} files: {}", mode, report.relocated.len());

    if !report.is_complete() {
        for (key, error) in &report.failed {
            eprintln!("❌ {}: {}", key, error);
        }
        return Err(ControllerError::StorageError {
            operation: mode.to_string(),
            bucket: args.source_bucket,
            key: format!("{} objects", report.failed.len()),
            message: "some objects could not be relocated".to_string(),
        });
    }
    Ok(())
}

fn print_frame(df: &DataFrame, output: &FrameOutput) -> Result<()> {
    let (rows, columns) = df.shape();
    eprintln!("DataFrame shape: ({}, {})", rows, columns);

    let shown = if output.head == 0 { df.clone() } else { df.head(output.head) };
    if output.json {
        println!("{}", serde_json::to_string_pretty(&shown.to_json_records())?);
    } else {
        print!("{}", String::from_utf8_lossy(&shown.to_csv_bytes()?));
    }
    Ok(())
}
