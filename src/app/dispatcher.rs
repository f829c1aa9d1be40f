// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Drives one cluster from the terminal until it closes.

use anyhow::{Context, Result};
use cssh::{
    cluster::PROMPT_LABEL,
    presentation::{ControlLine, ControlSurface, TerminalControl},
};

use super::initialization::AppContext;

pub async fn run_cluster(ctx: AppContext) -> Result<()> {
    let title = format!("{PROMPT_LABEL} {}", ctx.target);
    let (control, mut lines) = TerminalControl::spawn(title, Some(ctx.history_path.clone()));

    let controller = ctx
        .manager
        .open(ctx.target.clone(), control.clone())
        .await
        .with_context(|| format!("Failed to open {}", ctx.target))?;

    if controller.session_count().await == 0 {
        ctx.manager.close(&controller).await;
        anyhow::bail!("No session could be opened for {}", ctx.target);
    }

    let interrupt = tokio::signal::ctrl_c();
    let terminate = terminate_signal();
    tokio::pin!(interrupt);
    tokio::pin!(terminate);

    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(ControlLine::Line(line)) => {
                    controller.handle_line(&line).await;
                }
                Some(ControlLine::Interrupted) => {
                    control.print("^C");
                    controller.render_prompt().await;
                }
                Some(ControlLine::Eof) | None => {
                    tracing::debug!("Control input ended, closing {}", ctx.target);
                    break;
                }
            },
            _ = controller.closed() => break,
            _ = &mut interrupt => {
                tracing::info!("Interrupted, closing {}", ctx.target);
                break;
            }
            _ = &mut terminate => {
                tracing::info!("Terminated, closing {}", ctx.target);
                break;
            }
        }
    }

    ctx.manager.close(&controller).await;
    ctx.transport.wait_for_exit().await;
    Ok(())
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
