use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    EventType,
    Handler,
    OrderCompletedEvent,
    OrderPurchasedEvent,
    OrdersAdvancedEvent,
};

type BoxedHook = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Cloned into every API object that emits events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_purchased_producer: Vec<EventProducer<OrderPurchasedEvent>>,
    pub orders_advanced_producer: Vec<EventProducer<OrdersAdvancedEvent>>,
    pub order_completed_producer: Vec<EventProducer<OrderCompletedEvent>>,
}

impl EventProducers {
    pub async fn publish(&self, event: EventType) {
        match event {
            EventType::OrderPurchased(ev) => {
                for producer in &self.order_purchased_producer {
                    producer.publish_event(ev.clone()).await;
                }
            },
            EventType::OrdersAdvanced(ev) => {
                for producer in &self.orders_advanced_producer {
                    producer.publish_event(ev.clone()).await;
                }
            },
            EventType::OrderCompleted(ev) => {
                for producer in &self.order_completed_producer {
                    producer.publish_event(ev.clone()).await;
                }
            },
        }
    }
}

pub struct EventHandlers {
    pub on_order_purchased: Option<EventHandler<OrderPurchasedEvent>>,
    pub on_orders_advanced: Option<EventHandler<OrdersAdvancedEvent>>,
    pub on_order_completed: Option<EventHandler<OrderCompletedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_purchased = hooks.on_order_purchased.map(|f| EventHandler::new(buffer_size, f));
        let on_orders_advanced = hooks.on_orders_advanced.map(|f| EventHandler::new(buffer_size, f));
        let on_order_completed = hooks.on_order_completed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_purchased, on_orders_advanced, on_order_completed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_purchased {
            result.order_purchased_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_orders_advanced {
            result.orders_advanced_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_completed {
            result.order_completed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered hook. Each task ends once all of its producers have been dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_order_purchased {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_orders_advanced {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_completed {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_purchased: Option<Handler<OrderPurchasedEvent>>,
    pub on_orders_advanced: Option<Handler<OrdersAdvancedEvent>>,
    pub on_order_completed: Option<Handler<OrderCompletedEvent>>,
}

impl EventHooks {
    pub fn on_order_purchased<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPurchasedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_purchased = Some(Arc::new(f));
        self
    }

    pub fn on_orders_advanced<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrdersAdvancedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_orders_advanced = Some(Arc::new(f));
        self
    }

    pub fn on_order_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCompletedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_completed = Some(Arc::new(f));
        self
    }
}
