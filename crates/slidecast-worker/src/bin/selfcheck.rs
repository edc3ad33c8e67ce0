use std::path::Path;

use slidecast_media::{check_ffmpeg, check_ffprobe};
use slidecast_worker::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env();

    println!(
        "slidecast-selfcheck: starting with output_dir={}",
        config.output_dir.display()
    );
    ensure_output_dir(&config.output_dir).await?;
    ensure_store(&config.store_path).await?;
    ensure_media_tools()?;
    ensure_env_present(&["GEMINI_API_KEY"])?;

    println!("slidecast-selfcheck: ok");
    Ok(())
}

async fn ensure_output_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {}", path.display(), e))
}

async fn ensure_store(path: &Path) -> anyhow::Result<()> {
    if !tokio::fs::try_exists(path).await? {
        return Err(anyhow::anyhow!("content store {} not found", path.display()));
    }
    Ok(())
}

fn ensure_media_tools() -> anyhow::Result<()> {
    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!(
        "slidecast-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        match std::env::var(var) {
            Ok(v) if !v.trim().is_empty() => {}
            _ => return Err(anyhow::anyhow!("missing required env var {}", var)),
        }
    }
    Ok(())
}
