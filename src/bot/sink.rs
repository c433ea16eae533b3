//! Discord implementation of the notification sink.
//!
//! Owner notices go out as DMs, diagnostics go to the operator channel, and
//! filed records are posted to the flight-plan channel with their cancel
//! control. Rendering is shared with the command drivers via `bot::menus`.

use crate::bot::menus;
use crate::config::refdata::RangeData;
use crate::config::settings::Settings;
use crate::core::collaborators::{NotificationSink, OwnerNotice, RouteArtifact};
use crate::core::record::{FinalRecord, Owner};
use crate::core::session::Fields;
use crate::errors::Result;
use async_trait::async_trait;
use poise::serenity_prelude::{
    ChannelId, CreateAttachment, CreateMessage, Http, UserId,
};
use std::sync::Arc;

/// Fans notifications out through the Discord HTTP API.
pub struct DiscordSink {
    http: Arc<Http>,
    settings: Arc<Settings>,
    data: Arc<RangeData>,
    guild_icon: Option<String>,
}

impl DiscordSink {
    /// Creates a sink bound to one guild's icon and the configured channels.
    #[must_use]
    pub const fn new(
        http: Arc<Http>,
        settings: Arc<Settings>,
        data: Arc<RangeData>,
        guild_icon: Option<String>,
    ) -> Self {
        Self {
            http,
            settings,
            data,
            guild_icon,
        }
    }

    fn icon(&self) -> Option<&str> {
        self.guild_icon.as_deref()
    }

    fn summary_message(
        &self,
        record: &FinalRecord,
        route: Option<&RouteArtifact>,
        with_cancel: bool,
    ) -> CreateMessage {
        let mut embed = menus::record_embed(&self.data, record, self.icon());
        let mut message = CreateMessage::new();
        if let Some(route) = route {
            let filename = format!("{}.png", record.serial);
            message = message.add_file(CreateAttachment::bytes(route.image.clone(), filename.clone()));
            embed = embed.image(format!("attachment://{filename}"));
        }
        message = message.embed(embed);
        if with_cancel {
            message = message.components(vec![menus::cancel_button_row(&record.serial)]);
        }
        message
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn notify_owner(&self, owner: &Owner, notice: OwnerNotice<'_>) -> Result<()> {
        let channel = UserId::new(owner.id)
            .create_dm_channel(&self.http)
            .await?
            .id;

        match notice {
            OwnerNotice::Filed { record, route } => {
                channel
                    .send_message(&self.http, self.summary_message(record, None, false))
                    .await?;

                // air-to-ground flights also get their range brief
                if record.fields.get("taskings") == Some("AG") {
                    if let Some(range) = record.fields.get("range") {
                        if let Ok(embed) =
                            menus::range_info_embed(&self.data, range, false, self.icon())
                        {
                            channel
                                .send_message(&self.http, CreateMessage::new().embed(embed))
                                .await?;
                        }
                    }
                }

                if let Some(route) = route {
                    let filename = format!("{}.png", record.serial);
                    let message = CreateMessage::new()
                        .add_file(CreateAttachment::bytes(route.image.clone(), filename.clone()))
                        .embed(
                            menus::route_embed(&record.serial, &route.description)
                                .image(format!("attachment://{filename}")),
                        );
                    channel.send_message(&self.http, message).await?;
                }
            }
            OwnerNotice::RoutingFailed => {
                channel
                    .send_message(
                        &self.http,
                        CreateMessage::new().content(
                            "There was a problem retrieving your auto-route image.\n\nThe operators have been notified.",
                        ),
                    )
                    .await?;
            }
            OwnerNotice::FilingFailed => {
                channel
                    .send_message(
                        &self.http,
                        CreateMessage::new().content(
                            "There was a problem filing your flight plan.\n\nThe operators have been notified.",
                        ),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn notify_operators(&self, context: &str, error: &str, fields: &Fields) -> Result<()> {
        ChannelId::new(self.settings.operator_channel)
            .send_message(
                &self.http,
                CreateMessage::new().content(format!("{context}:\n```\n{error}\n\n{fields}```")),
            )
            .await?;
        Ok(())
    }

    async fn post_public(
        &self,
        record: &FinalRecord,
        route: Option<&RouteArtifact>,
    ) -> Result<()> {
        ChannelId::new(self.settings.flight_plan_channel)
            .send_message(&self.http, self.summary_message(record, route, true))
            .await?;
        Ok(())
    }
}
