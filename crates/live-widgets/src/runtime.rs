//! The widget runtime.
//!
//! [`Runtime`] is an explicitly constructed context object owning the
//! document, the widget catalog, the live instance table, the message bus,
//! and the virtual-clock timer service. There is no global state: hosts build
//! a runtime, register widgets, mutate the document, and drive time forward
//! with [`Runtime::advance`].

use std::{collections::BTreeMap, fmt, rc::Rc};

use serde_json::{Value as JsonValue, json};
use tracing::{debug, trace, warn};

use crate::{
    descriptor::{Controller, Hook, MessageHook, WidgetDescriptor},
    dom::{
        DATA_PREFIX, Document, Element, ElementId, EventKind, GROUP_ATTR, PointerEvent,
        WIDGET_ATTR, WIDGET_ID_ATTR,
    },
    error::{Error, Result},
    message::{BusCallback, Envelope, MAX_DELIVERY_DEPTH, MessageBus, SubscriberId},
    model::Model,
    monitor::{Monitor, MonitorConfig, eligible},
    name::WidgetName,
    registry::Registry,
    timer::{TimerId, TimerTask, Timers},
    value::Value,
};

/// Identifier for a live widget instance. Allocated from a monotonic counter,
/// so ids never collide for the lifetime of the runtime; the decimal form is
/// what gets stamped into `data-widget-id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Construct an instance id from its raw value.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live widget bound to a document element.
pub struct WidgetInstance {
    /// Instance id.
    id: InstanceId,
    /// Widget type this instance was built from.
    widget: WidgetName,
    /// Mutable state, seeded from defaults and markup attributes.
    pub(crate) model: Model,
    /// Behavior set, sharing action closures with the compiled template.
    pub(crate) controller: Controller,
    /// Element the instance exclusively owns.
    element: ElementId,
    /// Message handler.
    pub(crate) handle_message: MessageHook,
    /// Reinit hook.
    pub(crate) reinit: Hook,
    /// Bus subscription taken out for the model's link channel, if any.
    subscription: Option<(String, SubscriberId)>,
}

impl WidgetInstance {
    /// Instance id.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Widget type name.
    pub fn widget(&self) -> &WidgetName {
        &self.widget
    }

    /// The instance's state.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The element this instance is bound to.
    pub fn element(&self) -> ElementId {
        self.element
    }
}

/// Where an event listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    /// Fires only for events targeting the element.
    Element(ElementId),
    /// Fires for every event of the kind, regardless of target.
    Document,
}

/// An event listener registered by a widget instance: when a matching event
/// is dispatched, the named action is invoked with the event's position.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Listener {
    /// Attachment point.
    scope: ListenerScope,
    /// Event kind to match.
    kind: EventKind,
    /// Owning instance.
    instance: InstanceId,
    /// Action invoked on match.
    action: String,
}

/// The widget runtime: document, catalog, instances, bus, timers, clock.
pub struct Runtime {
    /// The live document.
    pub(crate) document: Document,
    /// The widget catalog.
    pub(crate) registry: Registry,
    /// Live instances in id order.
    pub(crate) instances: BTreeMap<InstanceId, WidgetInstance>,
    /// The message bus tables.
    pub(crate) bus: MessageBus,
    /// Timer table and deadline heap.
    pub(crate) timers: Timers,
    /// Virtual clock, in ticks.
    pub(crate) clock: u64,
    /// Document monitor state.
    pub(crate) monitor: Monitor,
    /// Registered event listeners, in registration order.
    listeners: Vec<Listener>,
    /// Current reentrant delivery depth.
    delivery_depth: usize,
    /// Next instance id to allocate.
    next_instance: u64,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime with default monitor configuration. Scanning starts
    /// armed unless the configuration disables autostart.
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    /// Create a runtime with explicit monitor configuration.
    pub fn with_config(config: MonitorConfig) -> Self {
        let autostart = config.autostart;
        let mut rt = Self {
            document: Document::new(),
            registry: Registry::new(),
            instances: BTreeMap::new(),
            bus: MessageBus::new(),
            timers: Timers::new(),
            clock: 0,
            monitor: Monitor::new(config),
            listeners: Vec::new(),
            delivery_depth: 0,
            next_instance: 1,
        };
        if autostart {
            rt.start_scanning();
        }
        rt
    }

    /// The live document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The live document, mutable. Hosts use this to build and mutate the
    /// element tree; new widget-marked elements are picked up on the next
    /// scan.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Current virtual time, in ticks.
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Register a widget type. Errors leave the catalog untouched.
    pub fn add_widget(&mut self, descriptor: WidgetDescriptor) -> Result<()> {
        self.registry.add_widget(descriptor).inspect_err(|e| {
            warn!(error = %e, "widget registration rejected");
        })
    }

    /// Register an extension of an existing widget type.
    pub fn extend_widget(&mut self, base: &str, descriptor: WidgetDescriptor) -> Result<()> {
        self.registry
            .extend_widget(base, descriptor)
            .inspect_err(|e| {
                warn!(error = %e, base, "widget extension rejected");
            })
    }

    /// Look up a live instance.
    pub fn instance(&self, id: InstanceId) -> Option<&WidgetInstance> {
        self.instances.get(&id)
    }

    /// Iterate over live instances in id order.
    pub fn instances(&self) -> impl Iterator<Item = &WidgetInstance> {
        self.instances.values()
    }

    /// Find the instance bound to an element, if any.
    pub fn instance_for_element(&self, element: ElementId) -> Option<InstanceId> {
        self.instances
            .values()
            .find(|i| i.element == element)
            .map(|i| i.id)
    }

    /// Subscribe an arbitrary callback to a channel under a fresh id.
    pub fn subscribe(&mut self, channel: impl Into<String>, callback: BusCallback) -> SubscriberId {
        self.bus.subscribe(channel, callback)
    }

    /// Idempotent upsert of a callback under an explicit subscriber id.
    pub fn register_listener(
        &mut self,
        channel: impl Into<String>,
        id: SubscriberId,
        callback: BusCallback,
    ) {
        self.bus.register_listener(channel, id, callback);
    }

    /// Instantiate the widget named by an element's `data-widget` attribute.
    ///
    /// The element is stamped with `data-widget-id` before construction runs,
    /// so a scan arriving mid-build cannot double-initialize it. A failing
    /// construct or reinit hook tears the partial instance down again but
    /// leaves the marker in place: the widget is dropped, not retried.
    pub fn initialize_widget(&mut self, element: ElementId) -> Result<InstanceId> {
        let widget = self
            .document
            .attr(element, WIDGET_ATTR)
            .ok_or(Error::MissingWidgetAttr)?
            .to_string();
        let spec = self
            .registry
            .lookup(&widget)
            .ok_or_else(|| Error::UnknownWidget(widget.clone()))?
            .clone();

        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        self.document
            .set_attr(element, WIDGET_ID_ATTR, id.to_string())?;

        // Seed the model: defaults first, then projected attributes, so
        // markup wins on collision.
        let mut model = spec.model.clone();
        if let Some(el) = self.document.element(element) {
            for (attr_name, attr_value) in el.attributes() {
                if attr_name == WIDGET_ATTR || attr_name == WIDGET_ID_ATTR || attr_name == GROUP_ATTR
                {
                    continue;
                }
                if let Some(field) = attr_name.strip_prefix(DATA_PREFIX) {
                    model.set(field, Value::Str(attr_value.clone()));
                }
            }
        }

        self.instances.insert(
            id,
            WidgetInstance {
                id,
                widget: spec.name.clone(),
                model,
                controller: spec.controller.clone(),
                element,
                handle_message: Rc::clone(&spec.handle_message),
                reinit: Rc::clone(&spec.reinit),
                subscription: None,
            },
        );

        // Construct chain, base-first for extensions.
        for hook in &spec.constructs {
            if let Err(e) = hook(&mut WidgetCtx::new(self, id)) {
                return Err(self.fail_instance(id, &widget, e));
            }
        }

        // Link subscription: a truthy `link` field wires the instance to its
        // channel, unwrapping envelopes into handle_message.
        if self.instances[&id].model.is_truthy("link")
            && let Some(link) = self.instances[&id].model.get_str("link").map(str::to_string)
        {
            let sid = self.bus.subscribe(
                link.clone(),
                Rc::new(move |rt: &mut Runtime, env: &Envelope| rt.deliver_to(id, env)),
            );
            if let Some(inst) = self.instances.get_mut(&id) {
                inst.subscription = Some((link, sid));
            }
        }

        let reinit = Rc::clone(&self.instances[&id].reinit);
        if let Err(e) = reinit(&mut WidgetCtx::new(self, id)) {
            return Err(self.fail_instance(id, &widget, e));
        }

        debug!(instance = %id, widget, "widget instantiated");
        Ok(id)
    }

    /// Tear down a partially constructed instance after a hook failure. The
    /// element keeps its marker attribute so the monitor does not retry.
    fn fail_instance(&mut self, id: InstanceId, widget: &str, cause: Error) -> Error {
        if let Some(inst) = self.instances.remove(&id)
            && let Some((channel, sid)) = inst.subscription
        {
            self.bus.unsubscribe(&channel, sid);
        }
        self.listeners.retain(|l| l.instance != id);
        self.timers.cancel_for(id);
        let err = Error::Instantiation {
            widget: widget.to_string(),
            message: cause.to_string(),
        };
        warn!(instance = %id, error = %err, "widget construction failed");
        err
    }

    /// Invoke a controller action on an instance.
    pub fn invoke(&mut self, id: InstanceId, action: &str, args: &[Value]) -> Result<Value> {
        let f = self
            .instances
            .get(&id)
            .ok_or(Error::InstanceNotFound)?
            .controller
            .get(action)
            .ok_or_else(|| Error::UnknownAction(action.to_string()))?;
        f(&mut WidgetCtx::new(self, id), args)
    }

    /// Deliver an envelope to a single instance's message handler.
    pub(crate) fn deliver_to(&mut self, id: InstanceId, envelope: &Envelope) -> Result<()> {
        let hook = Rc::clone(
            &self
                .instances
                .get(&id)
                .ok_or(Error::InstanceNotFound)?
                .handle_message,
        );
        hook(
            &mut WidgetCtx::new(self, id),
            &envelope.message,
            envelope.channel.as_deref(),
        )
    }

    /// Broadcast an envelope to every current subscriber of a channel,
    /// synchronously and in subscriber-id order. Returns the number of
    /// successful deliveries.
    ///
    /// A failing subscriber is logged and skipped; it never blocks delivery
    /// to the others and never propagates to the sender. Reentrant sends past
    /// [`MAX_DELIVERY_DEPTH`] are dropped with a warning.
    pub fn send_message(&mut self, channel: &str, envelope: &Envelope) -> usize {
        if self.delivery_depth >= MAX_DELIVERY_DEPTH {
            warn!(error = %Error::DeliveryDepth(channel.to_string()), "message dropped");
            return 0;
        }
        self.delivery_depth += 1;
        let subscribers = self.bus.subscribers(channel);
        let mut delivered = 0;
        for (sid, callback) in subscribers {
            match callback(&mut *self, envelope) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(channel, subscriber = %sid, error = %e, "subscriber failed");
                }
            }
        }
        self.delivery_depth -= 1;
        trace!(channel, delivered, "message sent");
        delivered
    }

    /// Dispatch a pointer event to matching listeners. Returns the number of
    /// actions invoked.
    pub fn dispatch(&mut self, event: &PointerEvent) -> usize {
        let matched: Vec<(InstanceId, String)> = self
            .listeners
            .iter()
            .filter(|l| {
                l.kind == event.kind
                    && match l.scope {
                        ListenerScope::Document => true,
                        ListenerScope::Element(el) => event.target == Some(el),
                    }
            })
            .map(|l| (l.instance, l.action.clone()))
            .collect();
        let args = [Value::Float(event.page_x)];
        let mut invoked = 0;
        for (instance, action) in matched {
            match self.invoke(instance, &action, &args) {
                Ok(_) => invoked += 1,
                Err(e) => {
                    warn!(instance = %instance, action, error = %e, "event handler failed");
                }
            }
        }
        invoked
    }

    /// Register an event listener. Identical registrations are deduplicated.
    pub(crate) fn add_event_listener(
        &mut self,
        scope: ListenerScope,
        kind: EventKind,
        instance: InstanceId,
        action: impl Into<String>,
    ) {
        let listener = Listener {
            scope,
            kind,
            instance,
            action: action.into(),
        };
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    /// Remove an event listener by its registration key.
    pub(crate) fn remove_event_listener(
        &mut self,
        scope: ListenerScope,
        kind: EventKind,
        instance: InstanceId,
        action: &str,
    ) {
        self.listeners.retain(|l| {
            !(l.scope == scope && l.kind == kind && l.instance == instance && l.action == action)
        });
    }

    /// Number of registered event listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Cancel a timer by id.
    pub fn clear_timer(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Is a timer still live?
    pub fn timer_active(&self, id: TimerId) -> bool {
        self.timers.is_active(id)
    }

    /// Advance the virtual clock by `ticks`, firing due timers in deadline
    /// order. Scan timers walk the document; action timers invoke controller
    /// actions.
    pub fn advance(&mut self, ticks: u64) {
        let target = self.clock + ticks;
        while let Some(deadline) = self.timers.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock = deadline;
            for (_, task) in self.timers.due(deadline) {
                self.run_task(&task);
            }
        }
        self.clock = target;
    }

    /// Advance the virtual clock by a single tick.
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Run a fired timer task.
    fn run_task(&mut self, task: &TimerTask) {
        match task {
            TimerTask::Scan => {
                let _ = self.search_for_elements();
            }
            TimerTask::Action { instance, action } => {
                if let Err(e) = self.invoke(*instance, action, &[]) {
                    warn!(instance = %instance, action, error = %e, "timer action failed");
                }
            }
        }
    }

    /// Walk the document and initialize every eligible element. Returns the
    /// instances created by this pass; a second pass over an unchanged
    /// document creates none.
    pub fn search_for_elements(&mut self) -> Vec<InstanceId> {
        let from = self.monitor.config.scan_root.unwrap_or(self.document.root());
        let mut found = Vec::new();
        self.document.visit_preorder(from, &mut |id, el| {
            if eligible(el) {
                found.push(id);
            }
        });

        let mut created = Vec::new();
        for element in found {
            match self.initialize_widget(element) {
                Ok(id) => created.push(id),
                Err(e) => {
                    warn!(error = %e, "widget initialization failed during scan");
                }
            }
        }
        if !created.is_empty() {
            debug!(count = created.len(), "scan instantiated widgets");
        }
        created
    }

    /// Start (or restart) recurring scans. Any existing scan timer is
    /// cancelled first, so at most one is ever armed.
    pub fn start_scanning(&mut self) {
        if let Some(t) = self.monitor.timer.take() {
            self.timers.cancel(t);
        }
        let interval = self.monitor.config.interval;
        self.monitor.timer = Some(
            self.timers
                .schedule(self.clock, interval, Some(interval), TimerTask::Scan),
        );
    }

    /// Stop recurring scans. Scanning can be resumed with
    /// [`start_scanning`](Self::start_scanning).
    pub fn stop_scanning(&mut self) {
        if let Some(t) = self.monitor.timer.take() {
            self.timers.cancel(t);
        }
    }

    /// Is the scan timer currently armed?
    pub fn is_scanning(&self) -> bool {
        self.monitor.timer.is_some()
    }

    /// Restrict future scans to the subtree under `root`, or clear the
    /// restriction with `None`.
    pub fn set_scan_root(&mut self, root: Option<ElementId>) {
        self.monitor.config.scan_root = root;
    }

    /// Produce a JSON snapshot of the runtime: registered widget types, live
    /// instances with their models, channel subscriber counts, and the
    /// clock. Intended for logging and debugging, not round-tripping.
    pub fn dump(&self) -> JsonValue {
        let mut widgets: Vec<String> = self.registry.names().map(ToString::to_string).collect();
        widgets.sort();

        let instances: Vec<JsonValue> = self
            .instances()
            .map(|inst| {
                json!({
                    "id": inst.id().raw(),
                    "widget": inst.widget().as_str(),
                    "model": inst.model()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect::<serde_json::Map<_, _>>(),
                })
            })
            .collect();

        let mut channels: Vec<JsonValue> = self
            .bus
            .channels()
            .map(|(name, count)| json!({ "channel": name, "subscribers": count }))
            .collect();
        channels.sort_by_key(|c| c["channel"].as_str().map(str::to_string));

        json!({
            "clock": self.now(),
            "widgets": widgets,
            "instances": instances,
            "channels": channels,
            "elements": self.document().len(),
        })
    }
}

/// Execution context handed to hooks, actions and message handlers: exclusive
/// access to the runtime, scoped to one instance. All instance state flows
/// through this context rather than through captured references.
pub struct WidgetCtx<'a> {
    /// The runtime being borrowed.
    rt: &'a mut Runtime,
    /// Instance this context is scoped to.
    id: InstanceId,
}

impl<'a> WidgetCtx<'a> {
    /// Build a context scoped to an instance.
    pub(crate) fn new(rt: &'a mut Runtime, id: InstanceId) -> Self {
        Self { rt, id }
    }

    /// The instance id.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The instance's bound element.
    pub fn element(&self) -> ElementId {
        self.instance().element
    }

    /// Borrow the instance. Contexts only exist while the instance is live.
    fn instance(&self) -> &WidgetInstance {
        self.rt
            .instances
            .get(&self.id)
            .expect("instance missing from context")
    }

    /// The instance's model.
    pub fn model(&self) -> &Model {
        &self.instance().model
    }

    /// The instance's model, mutable.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self
            .rt
            .instances
            .get_mut(&self.id)
            .expect("instance missing from context")
            .model
    }

    /// The live document.
    pub fn document(&self) -> &Document {
        &self.rt.document
    }

    /// Read an attribute off the bound element.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.rt
            .document
            .attr(self.element(), name)
            .map(str::to_string)
    }

    /// Read an inline style property off the bound element.
    pub fn style(&self, prop: &str) -> Option<String> {
        self.rt
            .document
            .element(self.element())
            .and_then(|el| el.style().get(prop))
            .map(str::to_string)
    }

    /// Set an inline style property on the bound element. A no-op when the
    /// element has left the document.
    pub fn set_style(&mut self, prop: &str, value: &str) {
        let element = self.element();
        if let Some(el) = self.rt.document.element_mut(element) {
            el.style_mut().set(prop, value);
        }
    }

    /// The bound element's laid-out width, or zero if it left the document.
    pub fn client_width(&self) -> f64 {
        self.rt
            .document
            .element(self.element())
            .map_or(0.0, Element::client_width)
    }

    /// The bound element's laid-out height, or zero if it left the document.
    pub fn client_height(&self) -> f64 {
        self.rt
            .document
            .element(self.element())
            .map_or(0.0, Element::client_height)
    }

    /// The bound element's horizontal offset, or zero if it left the
    /// document.
    pub fn offset_left(&self) -> f64 {
        self.rt
            .document
            .element(self.element())
            .map_or(0.0, Element::offset_left)
    }

    /// Invoke a sibling action on this instance.
    pub fn invoke(&mut self, action: &str, args: &[Value]) -> Result<Value> {
        self.rt.invoke(self.id, action, args)
    }

    /// Broadcast on this instance's own link channel, tagging the envelope
    /// with an optional channel discriminator. Without a link the message
    /// goes nowhere. Returns the number of deliveries.
    pub fn send_message(&mut self, message: impl Into<Value>, channel: Option<&str>) -> usize {
        let Some(link) = self.model().get_str("link").map(str::to_string) else {
            warn!(instance = %self.id, "send_message without a link channel");
            return 0;
        };
        let envelope = Envelope::new(message, channel);
        self.rt.send_message(&link, &envelope)
    }

    /// Arm a repeating timer invoking an action on this instance every
    /// `period` ticks.
    pub fn set_interval(&mut self, action: impl Into<String>, period: u64) -> TimerId {
        self.rt.timers.schedule(
            self.rt.clock,
            period,
            Some(period),
            TimerTask::Action {
                instance: self.id,
                action: action.into(),
            },
        )
    }

    /// Cancel a timer. Idempotent.
    pub fn clear_timer(&mut self, id: TimerId) -> bool {
        self.rt.timers.cancel(id)
    }

    /// Register an event listener routing to an action on this instance.
    pub fn listen(&mut self, scope: ListenerScope, kind: EventKind, action: impl Into<String>) {
        self.rt.add_event_listener(scope, kind, self.id, action);
    }

    /// Remove a previously registered event listener.
    pub fn unlisten(&mut self, scope: ListenerScope, kind: EventKind, action: &str) {
        self.rt.remove_event_listener(scope, kind, self.id, action);
    }
}
