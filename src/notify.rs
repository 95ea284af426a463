//! Result reporting boundary. The core composes the message; actually
//! delivering it (SMTP, etc.) belongs to an outer layer.

use tracing::info;

use crate::error::BotError;
use crate::hunt::HuntReport;
use crate::species::Species;

pub trait Notifier {
    fn notify(&self, species: &Species, report: &HuntReport) -> Result<(), BotError>;
}

/// Default notifier: write the composed message to the log.
pub struct LogNotifier {
    pub username: String,
}

impl Notifier for LogNotifier {
    fn notify(&self, species: &Species, report: &HuntReport) -> Result<(), BotError> {
        info!(subject = %compose_subject(species, report.shiny_found), "hunt finished");
        info!("{}", compose_body(&self.username, species, report));
        for attachment in &report.attachments {
            info!(attachment = %attachment.display(), "attachment candidate");
        }
        Ok(())
    }
}

pub fn compose_subject(species: &Species, shiny_found: bool) -> String {
    if shiny_found {
        format!("FOUND Shiny {}!", species.name)
    } else {
        format!("Shiny Hunting Status For {}", species.name)
    }
}

pub fn compose_body(username: &str, species: &Species, report: &HuntReport) -> String {
    let paragraph = if report.shiny_found {
        format!(
            "I hope you're sitting down, because the news of a lifetime is coming upon you.<br>\
             Upon arrival to your gaming system, you will find the battle in progress of a shiny \
             <b>{}</b>! Take great care to catch the beast as there are no assurances of another \
             one arriving anytime soon.",
            species.name
        )
    } else {
        format!(
            "Unfortunately, no shiny <b>{}</b> has been found yet. \
             Rest assured, hunting will continue until a shiny is found!",
            species.name
        )
    };
    format!(
        "<html>\n  <body>\n    Hi {username},\n    <br>\n    <p>{paragraph}</p>\n    \
         <p>Number of attempts: {}</p>\n    <br>\n    Regards,\n    <br>\n    \
         Shiny Hunting Team\n  </body>\n</html>",
        report.attempts
    )
}
