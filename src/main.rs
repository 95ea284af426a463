use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};

use shinybot::config::Settings;
use shinybot::emulator::{
    Emulator, EmulatorController, RdevBackend, RetroArchConfig, RetroArchProcess, Timing,
};
use shinybot::error::BotError;
use shinybot::hunt::{HuntOutcome, HuntReport, HuntRunner, SaveStateManager, StaticEncounter};
use shinybot::notify::{LogNotifier, Notifier};
use shinybot::species::Dex;
use shinybot::vision::{
    BattleDetector, ColorMetric, NameRecognizer, ScreenshotStore, SpriteClassifier,
};

/// Distinct exit codes so a supervisor can tell how the hunt ended.
const EXIT_INTERRUPT: i32 = 1;
const EXIT_TERMINATED: i32 = 2;
const EXIT_FAILURE: i32 = 3;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("hunt failed: {e}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

enum Ending {
    Finished(HuntOutcome, HuntReport),
    Interrupted,
    Terminated,
}

async fn run() -> Result<i32, BotError> {
    let settings = Settings::load()?;
    let retroarch = RetroArchConfig::parse(&settings.retroarch_cfg)?;
    let dex = Dex::load(&settings.assets_dir.join("dex.json"))?;
    let species = dex.resolve(
        &settings.species,
        &settings.game,
        &settings.assets_dir.join("sprites"),
    )?;

    let metric = ColorMetric::default();
    let recognizer = NameRecognizer::load(&settings.assets_dir, metric)?;
    let sprites = SpriteClassifier::load(&species, metric)?;
    let battles = match BattleDetector::load(&settings.assets_dir, metric) {
        Ok(detector) => Some(detector),
        Err(e) => {
            warn!("battle detection disabled: {e}");
            None
        }
    };
    let screenshots = ScreenshotStore::new(retroarch.screenshot_dir.clone());
    let timing = Timing::new(settings.emulator_avg_fps);

    // The swap is fatal before any button is pressed: a hunt must never
    // start on a half-staged save directory.
    let mut saves = SaveStateManager::new(
        retroarch.savefile_dir.clone(),
        settings.native_saves_dir.clone(),
        settings.rom_name.clone(),
    );
    saves.swap(&species.name)?;

    let controller = EmulatorController::new(
        Box::new(RdevBackend::default()),
        retroarch.player1.clone(),
        retroarch.hotkeys.clone(),
        timing,
    );
    let emulator = Emulator::new(controller, timing);
    let mut process = RetroArchProcess::new(settings.retroarch_app.clone());

    let cancel = CancellationToken::new();
    let encounter = match StaticEncounter::new(
        emulator,
        species.clone(),
        sprites,
        recognizer,
        battles,
        screenshots,
        timing,
    ) {
        Ok(encounter) => encounter,
        Err(e) => {
            // Nothing launched yet, but the saves are already swapped.
            cleanup(&mut process, &mut saves).await;
            return Err(e);
        }
    };
    let mut runner = HuntRunner::new(encounter, settings.max_attempts, cancel.clone());

    info!(species = %species.name, budget = settings.max_attempts, "starting hunt");
    let ending = launch_and_hunt(&mut process, &mut runner).await;

    match ending {
        Ok(Ending::Finished(HuntOutcome::ShinyFound, report)) => {
            // The battle stays on screen for the operator; the emulator
            // keeps running and the staged save stays live.
            LogNotifier {
                username: settings.username.clone(),
            }
            .notify(&species, &report)?;
            Ok(0)
        }
        Ok(Ending::Finished(HuntOutcome::BudgetExhausted, report)) => {
            cleanup(&mut process, &mut saves).await;
            LogNotifier {
                username: settings.username.clone(),
            }
            .notify(&species, &report)?;
            Ok(0)
        }
        Ok(Ending::Finished(HuntOutcome::Cancelled, _)) | Ok(Ending::Interrupted) => {
            warn!("keyboard interrupt");
            cancel.cancel();
            cleanup(&mut process, &mut saves).await;
            Ok(EXIT_INTERRUPT)
        }
        Ok(Ending::Terminated) => {
            warn!("termination signal");
            cancel.cancel();
            cleanup(&mut process, &mut saves).await;
            Ok(EXIT_TERMINATED)
        }
        Err(e) => {
            error!("exception occurred while shiny hunting");
            cleanup(&mut process, &mut saves).await;
            Err(e)
        }
    }
}

/// Launch the emulator, start the game, and drive the hunt loop, racing
/// the loop against cancellation signals. The signal futures are polled
/// from the first attempt onward, so a signal at any point during the
/// hunt takes the same cleanup path.
async fn launch_and_hunt(
    process: &mut RetroArchProcess,
    runner: &mut HuntRunner<StaticEncounter>,
) -> Result<Ending, BotError> {
    process.launch().await?;
    // Let the frontend finish opening before driving its menu.
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    tokio::select! {
        res = runner.run() => res.map(|(outcome, report)| Ending::Finished(outcome, report)),
        _ = tokio::signal::ctrl_c() => Ok(Ending::Interrupted),
        _ = terminate_signal() => Ok(Ending::Terminated),
    }
}

async fn terminate_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}

/// The one cleanup path every abnormal or exhausted ending goes through:
/// kill the emulator, then put the user's saves back. Both steps tolerate
/// being called when there is nothing left to do.
async fn cleanup(process: &mut RetroArchProcess, saves: &mut SaveStateManager) {
    if let Err(e) = process.kill().await {
        warn!("emulator did not shut down cleanly: {e}");
    }
    if let Err(e) = saves.cleanup() {
        error!("failed to restore original saves: {e}");
    }
}
