//! Feed abstraction
//!
//! The engine consumes `FeedMessage`s; any transport that can produce them in
//! arrival order implements `TradeFeed`.

use crate::core::PriceTick;
use crate::exchanges::parsing::ParseError;
use crate::Result;
use std::future::Future;

/// Unified message type pushed from the transport to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// Validated trade tick
    Trade(PriceTick),
    /// Acknowledgement or other non-trade control traffic
    Control,
    /// Payload that failed to decode
    Malformed(ParseError),
}

/// Trade stream interface
///
/// `next_message` returns `Ok(None)` once the stream has ended.
pub trait TradeFeed: Send {
    /// Feed name (for logging)
    fn name(&self) -> &'static str;

    /// Receive next message in arrival order
    fn next_message(&mut self) -> impl Future<Output = Result<Option<FeedMessage>>> + Send;

    /// Release the transport once the consumer is done with it
    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::trade_tick;

    #[test]
    fn test_feed_message_variants() {
        let msg = FeedMessage::Trade(trade_tick("SOLBTC", 0.001, 1_000));
        match msg {
            FeedMessage::Trade(tick) => assert_eq!(tick.symbol, "SOLBTC"),
            _ => panic!("Expected Trade variant"),
        }
        assert_ne!(
            FeedMessage::Control,
            FeedMessage::Malformed(ParseError::NotAnObject)
        );
    }

    struct OneShot(Option<FeedMessage>);

    impl TradeFeed for OneShot {
        fn name(&self) -> &'static str {
            "oneshot"
        }

        async fn next_message(&mut self) -> Result<Option<FeedMessage>> {
            Ok(self.0.take())
        }
    }

    #[test]
    fn test_feed_ends_with_none() {
        let mut feed = OneShot(Some(FeedMessage::Control));
        assert_eq!(feed.name(), "oneshot");
        let first = tokio_test::block_on(feed.next_message()).unwrap();
        assert_eq!(first, Some(FeedMessage::Control));
        assert!(tokio_test::block_on(feed.next_message()).unwrap().is_none());
        tokio_test::block_on(feed.close());
    }
}
