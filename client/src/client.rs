//! The client context: registry, session and per-pointer interaction state,
//! advanced once per rendered frame.

use std::time::Duration;

use presence_shared::config::InteractionConfig;
use presence_shared::frame::{AudioChunk, ControllerPose, HandPose, PlayerPose, Transform};

use crate::grab;
use crate::input::InputEvent;
use crate::keyboard::{Key, KeyMap};
use crate::layout::{LayerState, PanelLayout, SurfaceProvider};
use crate::links::{LinkAction, LinkGrid};
use crate::menu::{Clock, MenuAnimation, SystemClock};
use crate::pointer::{PointerInput, PointerState, POINTER_COUNT};
use crate::registry::EntityRegistry;
use crate::session::{Channel, ChannelMessage, RenderSink, SessionError, TransportSession};
use crate::surface::{resolve, Hit, SurfaceKind};
use crate::url_bar::{UrlBar, UrlBarAction, URL_BAR_WIDTH};

/// Everything the input device reports for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub head: Transform,
    pub pointers: [PointerInput; POINTER_COUNT],
    pub hands: [HandPose; 2],
}

/// Something the embedding application should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    KeyPressed { pointer: usize, key: Key },
    UrlBar(UrlBarAction),
    Link(LinkAction),
    HapticPulse { pointer: usize },
    MenuToggled { opening: bool },
    Grabbed { pointer: usize, object_id: u32 },
    Released { pointer: usize, object_id: u32 },
}

/// How to draw one pointer's ray this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerFeedback {
    pub hit: Option<Hit>,
    pub ray_length: f32,
    pub contact_visible: bool,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub pointers: [PointerFeedback; POINTER_COUNT],
    pub actions: Vec<ClientAction>,
}

pub struct PresenceClient<C: Channel> {
    config: InteractionConfig,
    session: TransportSession<C>,
    registry: EntityRegistry,
    pointers: [PointerState; POINTER_COUNT],
    menu: MenuAnimation,
    layout: Box<dyn SurfaceProvider>,
    clock: Box<dyn Clock>,
    key_map: KeyMap,
    url_bar: UrlBar,
    links: LinkGrid,
    portal_active: bool,
}

impl<C: Channel> PresenceClient<C> {
    pub fn new(channel: C, local_id: u32, config: InteractionConfig) -> Self {
        let menu = MenuAnimation::new(config.menu_duration(), config.menu_ease_exponent);
        Self {
            session: TransportSession::new(channel, local_id, false),
            registry: EntityRegistry::new(config.audio_queue_capacity),
            pointers: Default::default(),
            menu,
            layout: Box::new(PanelLayout::default()),
            clock: Box::new(SystemClock::default()),
            key_map: KeyMap::default(),
            url_bar: UrlBar::default(),
            links: LinkGrid::default(),
            portal_active: false,
            config,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_layout(mut self, layout: impl SurfaceProvider + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    pub fn with_key_map(mut self, key_map: KeyMap) -> Self {
        self.key_map = key_map;
        self
    }

    pub fn local_id(&self) -> u32 {
        self.session.local_id()
    }

    pub fn session(&self) -> &TransportSession<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TransportSession<C> {
        &mut self.session
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn pointer(&self, index: usize) -> Option<&PointerState> {
        self.pointers.get(index)
    }

    pub fn menu(&self) -> &MenuAnimation {
        &self.menu
    }

    pub fn url_bar(&self) -> &UrlBar {
        &self.url_bar
    }

    pub fn url_bar_mut(&mut self) -> &mut UrlBar {
        &mut self.url_bar
    }

    pub fn links(&self) -> &LinkGrid {
        &self.links
    }

    pub fn set_links(&mut self, links: Vec<String>) {
        self.links.set_links(links);
    }

    pub fn set_portal_active(&mut self, active: bool) {
        self.portal_active = active;
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.session.set_voice_enabled(enabled);
    }

    /// The channel just opened.
    pub fn on_open(&mut self) {
        self.session.on_open();
    }

    /// The channel closed. Remote state is stale and will be replayed on
    /// the next join. Returns a `Released` for every hold that was dropped.
    pub fn on_close(&mut self, sink: &mut dyn RenderSink) -> Vec<ClientAction> {
        for p in self.registry.participants() {
            sink.on_participant_removed(p.id);
        }
        for o in self.registry.objects() {
            sink.on_object_removed(o.id);
        }
        self.registry.clear();
        self.pointers
            .iter_mut()
            .enumerate()
            .filter_map(|(pointer, p)| {
                let object_id = grab::release(p)?;
                Some(ClientAction::Released { pointer, object_id })
            })
            .collect()
    }

    pub fn handle_message(
        &mut self,
        msg: ChannelMessage,
        sink: &mut dyn RenderSink,
    ) -> Result<(), SessionError> {
        self.session.handle_message(msg, &mut self.registry, sink)
    }

    pub fn send_audio(&mut self, samples: &[f32]) -> bool {
        self.session.send_audio(samples)
    }

    /// Next voice chunk to play for `id`, once enough are buffered.
    pub fn next_audio_chunk(&mut self, id: u32) -> Option<AudioChunk> {
        self.registry.next_audio_chunk(id, self.config.audio_min_buffered)
    }

    /// Run one frame: resolve rays, react to button edges, advance the menu,
    /// then publish our pose and any carried objects.
    pub fn tick(&mut self, input: &FrameInput) -> FrameOutput {
        let now = self.clock.now();
        let surfaces = self.layout.candidates(&LayerState {
            visible: self.menu.visible(),
            scale: self.menu.scale(),
            link_rows: self.links.shown().len(),
        });

        let mut actions = Vec::new();
        let mut feedback = [PointerFeedback {
            hit: None,
            ray_length: self.config.ray_distance,
            contact_visible: false,
            highlighted: false,
        }; POINTER_COUNT];

        for (i, pointer_input) in input.pointers.iter().enumerate() {
            self.pointers[i].input = *pointer_input;
            let hit = resolve(&pointer_input.ray, &surfaces, &self.config);
            feedback[i] = PointerFeedback {
                hit,
                ray_length: hit.map_or(self.config.ray_distance, |h| h.distance),
                contact_visible: hit.is_some(),
                highlighted: pointer_input.buttons.trigger,
            };

            let events = self.pointers[i].tracker.update(pointer_input.buttons);
            for event in events {
                match event {
                    InputEvent::MenuPressed => self.toggle_menu(&input.head, now, &mut actions),
                    InputEvent::GrabPressed => {
                        let threshold = self.config.grab_threshold;
                        if let Some(object_id) =
                            grab::grab(&mut self.pointers, i, &self.registry, threshold)
                        {
                            actions.push(ClientAction::Grabbed {
                                pointer: i,
                                object_id,
                            });
                        }
                    }
                    InputEvent::GrabReleased => {
                        if let Some(object_id) = grab::release(&mut self.pointers[i]) {
                            actions.push(ClientAction::Released {
                                pointer: i,
                                object_id,
                            });
                        }
                    }
                    InputEvent::TriggerPressed => {
                        actions.push(ClientAction::HapticPulse { pointer: i });
                        if let Some(hit) = hit {
                            self.activate(i, &hit, &mut actions);
                        }
                    }
                }
            }
        }

        self.menu.update(now);
        self.publish_pose(input);
        self.carry_objects(&mut actions);

        FrameOutput {
            pointers: feedback,
            actions,
        }
    }

    fn toggle_menu(&mut self, head: &Transform, now: Duration, actions: &mut Vec<ClientAction>) {
        if self.menu.is_animating() || self.portal_active {
            tracing::debug!("Menu press ignored");
            return;
        }
        let opening = self.menu.toggle(now);
        if opening {
            self.layout.place(head);
        }
        actions.push(ClientAction::MenuToggled { opening });
    }

    /// Route a trigger press to whatever the pointer is over.
    fn activate(&mut self, pointer: usize, hit: &Hit, actions: &mut Vec<ClientAction>) {
        match hit.kind {
            SurfaceKind::Keyboard => {
                let Some(key) = self.key_map.key_at(hit.x, hit.y).map(|k| k.key()) else {
                    return;
                };
                if let Some(a) = self.url_bar.handle_key(&key) {
                    actions.push(ClientAction::UrlBar(a));
                }
                actions.push(ClientAction::KeyPressed { pointer, key });
            }
            SurfaceKind::AddressBar => {
                if let Some(a) = self.url_bar.place_cursor(hit.x * URL_BAR_WIDTH) {
                    actions.push(ClientAction::UrlBar(a));
                }
            }
            SurfaceKind::GridRow(row) => {
                if let Some(a) = self.links.toggle(row) {
                    actions.push(ClientAction::Link(a));
                }
            }
        }
    }

    fn publish_pose(&mut self, input: &FrameInput) {
        let controller = |p: &PointerInput| ControllerPose {
            enabled: true,
            position: p.position(),
            orientation: p.orientation,
        };
        let pose = PlayerPose {
            head: input.head,
            controllers: [controller(&input.pointers[0]), controller(&input.pointers[1])],
            hands: input.hands,
        };
        self.session.send_player_pose(&pose);
    }

    fn carry_objects(&mut self, actions: &mut Vec<ClientAction>) {
        for (i, pointer) in self.pointers.iter_mut().enumerate() {
            match grab::carry(pointer, &mut self.registry) {
                grab::Carry::Idle => {}
                grab::Carry::Moved { id, pose } => {
                    self.session.send_object_pose(id, &pose);
                }
                grab::Carry::Lost(object_id) => actions.push(ClientAction::Released {
                    pointer: i,
                    object_id,
                }),
            }
        }
    }
}
