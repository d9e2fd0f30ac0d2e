//! Server-to-client wire events

use axum::extract::ws::Message;
use serde::Serialize;
use uuid::Uuid;

use fx_core::RateSnapshot;

/// Events emitted over the push channel.
///
/// `currency_update` is the only event type; `client_id` is present
/// only on the initial post-admission send.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent<'a> {
    CurrencyUpdate {
        rates: &'a RateSnapshot,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_id: Option<Uuid>,
    },
}

impl<'a> ServerEvent<'a> {
    /// Broadcast form, no client tag
    pub fn update(rates: &'a RateSnapshot) -> Self {
        ServerEvent::CurrencyUpdate {
            rates,
            client_id: None,
        }
    }

    /// Initial unicast form, tagged with the receiving connection's id
    pub fn initial(rates: &'a RateSnapshot, client_id: Uuid) -> Self {
        ServerEvent::CurrencyUpdate {
            rates,
            client_id: Some(client_id),
        }
    }

    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        Ok(Message::Text(serde_json::to_string(self)?))
    }
}
