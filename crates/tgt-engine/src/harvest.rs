use tgt_core::{
    classify::classify,
    domain::{KindFilter, MessageLink, Topic},
    links::parse_link,
    provider::{ChatProvider, MAX_MESSAGE_BATCH},
    Error, Result,
};
use tracing::{debug, error, info, warn};

use crate::{retry::RateLimitedExecutor, transfer::TransferStrategy};

/// What to harvest: a starting link, how many usable messages to transfer,
/// and the filters that decide usability.
#[derive(Clone, Debug)]
pub struct HarvestRequest {
    pub link: MessageLink,
    /// Target number of successful transfers, 1..=[`MAX_MESSAGE_BATCH`].
    pub count: usize,
    pub kind: KindFilter,
    /// Case-insensitive caption substrings; empty accepts every caption.
    pub caption_filters: Vec<String>,
    /// Extend past the initial range until `count` transfers succeeded.
    pub verify: bool,
    /// Dry run: classify and count, but move no bytes.
    pub test_mode: bool,
}

impl HarvestRequest {
    /// Build a request from a raw message link. Filters default to
    /// accept-everything; callers tighten them field by field.
    pub fn from_link(link: &str, count: usize) -> Result<Self> {
        Ok(Self {
            link: parse_link(link)?,
            count,
            kind: KindFilter::All,
            caption_filters: Vec::new(),
            verify: false,
            test_mode: false,
        })
    }

    /// Check request invariants. Runs before any session is opened.
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 || self.count > MAX_MESSAGE_BATCH {
            return Err(Error::InvariantViolation(format!(
                "count must be between 1 and {MAX_MESSAGE_BATCH}, got {}",
                self.count
            )));
        }
        if self.verify && self.caption_filters.is_empty() {
            return Err(Error::InvariantViolation(
                "verify requires at least one caption filter".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a harvest run: which source message ids were transferred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub transferred: Vec<i64>,
    pub requested: usize,
}

impl HarvestOutcome {
    pub fn fulfilled(&self) -> bool {
        self.transferred.len() >= self.requested
    }
}

/// Scans ascending message-id windows and hands usable messages to a
/// [`TransferStrategy`] until the requested count is reached or the range
/// is exhausted.
///
/// The initial window starts at the linked message id with length equal to
/// the requested count. A shortfall extends the window depending on context:
/// inside a forum topic the window always extends up to (and excluding) the
/// topic's top message; outside a topic it extends only when `verify` is set
/// and the previous window produced at least one transfer.
pub struct RangeHarvester<'a> {
    provider: &'a dyn ChatProvider,
    strategy: &'a dyn TransferStrategy,
    request: &'a HarvestRequest,
    executor: RateLimitedExecutor,
}

impl<'a> RangeHarvester<'a> {
    pub fn new(
        provider: &'a dyn ChatProvider,
        strategy: &'a dyn TransferStrategy,
        request: &'a HarvestRequest,
    ) -> Self {
        Self {
            provider,
            strategy,
            request,
            executor: RateLimitedExecutor::default(),
        }
    }

    pub async fn run(&self) -> Result<HarvestOutcome> {
        self.request.validate()?;

        let chat = &self.request.link.chat;
        let topic = match self.request.link.topic_id {
            Some(topic_id) => {
                let topic = self
                    .executor
                    .run(|| self.provider.get_forum_topic(chat, topic_id))
                    .await?
                    .ok_or(Error::TopicNotFound(topic_id))?;
                info!(topic_id, title = %topic.title, "harvesting inside topic");
                Some(topic)
            }
            None => None,
        };

        let start = self.request.link.message_id;
        let mut window: Vec<i64> = (start..start + self.request.count as i64).collect();
        let mut remaining = self.request.count;
        let mut transferred = Vec::new();

        while remaining > 0 && !window.is_empty() {
            let usable = self
                .scan_window(&window, remaining, topic.as_ref(), &mut transferred)
                .await?;
            if usable >= remaining {
                break;
            }

            let shortfall = remaining - usable;
            let next_id = window.last().copied().unwrap_or(start) + 1;

            match (&topic, self.request.verify) {
                (Some(topic), _) => {
                    // Topic ranges are bounded: extend up to the top message,
                    // one batch at a time.
                    let mut ids: Vec<i64> = (next_id..topic.top_message).collect();
                    ids.truncate(MAX_MESSAGE_BATCH);
                    if ids.is_empty() {
                        warn!(shortfall, topic_id = topic.id, "topic range exhausted");
                        break;
                    }
                    info!(
                        from = ids.first().copied(),
                        to = ids.last().copied(),
                        shortfall,
                        "extending window inside topic"
                    );
                    window = ids;
                    remaining = shortfall;
                }
                (None, true) if usable > 0 => {
                    window = (next_id..next_id + shortfall as i64).collect();
                    remaining = shortfall;
                    info!(
                        from = window.first().copied(),
                        to = window.last().copied(),
                        shortfall,
                        "extending window to verify count"
                    );
                }
                _ => {
                    warn!(
                        shortfall,
                        requested = self.request.count,
                        "range exhausted, accepting shortfall"
                    );
                    break;
                }
            }
        }

        Ok(HarvestOutcome {
            transferred,
            requested: self.request.count,
        })
    }

    /// Fetch one window and transfer its usable messages in ascending id
    /// order, stopping once `target` transfers succeeded. Transfer failures
    /// are logged and skipped. Returns the number of successful transfers.
    async fn scan_window(
        &self,
        ids: &[i64],
        target: usize,
        topic: Option<&Topic>,
        transferred: &mut Vec<i64>,
    ) -> Result<usize> {
        let chat = &self.request.link.chat;
        info!(
            from = ids.first().copied(),
            to = ids.last().copied(),
            target,
            "scanning message window"
        );

        let mut messages = self
            .executor
            .run(|| self.provider.get_messages(chat, ids))
            .await?;
        messages.sort_by_key(|m| m.id);

        let total = messages.len();
        let mut succeeded = 0usize;

        for (index, msg) in messages.iter().enumerate() {
            if let Some(topic) = topic {
                if msg.thread_id != Some(topic.id) {
                    debug!(message_id = msg.id, "outside topic, skipping");
                    continue;
                }
            }

            let classified = classify(
                msg,
                self.request.kind,
                &self.request.caption_filters,
                self.strategy.flow(),
            );

            if classified.usable {
                match self.strategy.transfer(msg, &classified).await {
                    Ok(()) => {
                        succeeded += 1;
                        transferred.push(msg.id);
                        info!(
                            message_id = msg.id,
                            done = transferred.len(),
                            requested = self.request.count,
                            "transferred"
                        );
                    }
                    Err(e) => {
                        error!(
                            message_id = msg.id,
                            position = index + 1,
                            total,
                            "transfer failed: {e}"
                        );
                    }
                }
            } else {
                debug!(message_id = msg.id, "not usable, skipping");
            }

            if succeeded >= target {
                break;
            }
            if let Some(delay) = self.strategy.pacing() {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(succeeded)
    }
}
