use fanpush_engine::events::{EventHandlers, EventHooks, OrderCompletedEvent, OrderPurchasedEvent, OrdersAdvancedEvent};
use log::*;

const ACTIVITY_TARGET: &str = "fps::activity";

/// Creates the event handlers that write committed purchases and pushes to the `fps::activity` log target.
///
/// Events are only published after the store commits, so this log never shows a purchase or push that was rolled back.
pub fn create_activity_log_handlers(buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_purchased(|ev| {
        let OrderPurchasedEvent { order, remaining_balance } = ev;
        Box::pin(async move {
            info!(
                target: ACTIVITY_TARGET,
                "📒️ {} bought order {} for {} fans at {}. Balance: {remaining_balance}",
                order.buyer_id,
                order.order_id,
                order.fans_target,
                order.coins_spent
            );
        })
    });
    hooks.on_orders_advanced(|ev| {
        let OrdersAdvancedEvent { requester, buyer_ids, checkpoint } = ev;
        Box::pin(async move {
            let buyers = buyer_ids.iter().map(|b| b.as_str()).collect::<Vec<_>>().join(", ");
            debug!(target: ACTIVITY_TARGET, "📒️ {requester} pushed [{buyers}]. Checkpoint: {checkpoint}");
        })
    });
    hooks.on_order_completed(|ev| {
        let OrderCompletedEvent { key, fans_target } = ev;
        Box::pin(async move {
            info!(
                target: ACTIVITY_TARGET,
                "📒️ Order {} for {} has received all {fans_target} fans", key.order_id, key.buyer_id
            );
        })
    });
    EventHandlers::new(buffer_size, hooks)
}
