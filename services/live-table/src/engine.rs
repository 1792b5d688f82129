//! Single-task engine owning every table, the ledger and the table store.
//!
//! Commands arrive through the [`Mailbox`](crate::ingress::Mailbox) and ticks from an interval;
//! both are handled on the same task so tables never need a lock.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use croupier_execution::roulette::{
    Anchor, Clock, Economy, EquipmentSlot, Item, Messenger, SessionSink, SpinListener, Visual,
    VisualId, Visuals,
};
use croupier_execution::{Game, Message, PhaseConfig};
use croupier_types::roulette::{
    Chip, GameRule, House, RawTableSettings, SessionRecord, Slot, TableSettings,
};
use rand::rngs::StdRng;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{resolve_table, save_tables, ServiceConfig, TableStore};
use crate::ingress::{AdminAction, Command, CommandError, Reply, TableSummary};
use crate::ledger::Ledger;
use crate::store::SessionStore;
use crate::templates::Templates;
use crate::ws::{OutboundEvent, TableStateMessage, VisualChange};

/// Table created when the store is empty.
pub const DEFAULT_TABLE: &str = "main";

/// Everything the tables share through their ports.
struct HostState {
    ledger: Ledger,
    templates: Templates,
    sessions: SessionStore,
    events: broadcast::Sender<OutboundEvent>,
    next_visual: VisualId,
}

impl HostState {
    fn publish(&self, event: OutboundEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

/// Port adapter handed to one table for the duration of a call.
struct TableHost<'a> {
    table: &'a str,
    state: &'a mut HostState,
}

impl Economy for TableHost<'_> {
    fn balance(&self, player: &str) -> u64 {
        self.state.ledger.balance(player)
    }

    fn deposit(&mut self, player: &str, amount: u64) -> bool {
        self.state.ledger.deposit(player, amount)
    }

    fn withdraw(&mut self, player: &str, amount: u64) -> bool {
        self.state.ledger.withdraw(player, amount)
    }
}

impl Visuals for TableHost<'_> {
    fn spawn(&mut self, visual: Visual, at: Anchor) -> VisualId {
        self.state.next_visual += 1;
        let id = self.state.next_visual;
        self.visual(VisualChange::Spawn { id, visual, at });
        id
    }

    fn teleport(&mut self, id: VisualId, at: Anchor) {
        self.visual(VisualChange::Teleport { id, at });
    }

    fn destroy(&mut self, id: VisualId) {
        self.visual(VisualChange::Destroy { id });
    }

    fn set_equipment(&mut self, id: VisualId, slot: EquipmentSlot, item: Item) {
        self.visual(VisualChange::Equip { id, slot, item });
    }
}

impl TableHost<'_> {
    fn visual(&self, change: VisualChange) {
        self.state.publish(OutboundEvent::Visual {
            table: self.table.to_string(),
            change,
        });
    }
}

impl Messenger for TableHost<'_> {
    fn send(&mut self, player: &str, message: Message) {
        let text = self.state.templates.render(&message);
        self.state.publish(OutboundEvent::Chat {
            player_id: player.to_string(),
            key: message.key(),
            text,
        });
    }

    fn open_chip_menu(&mut self, player: &str, chips: &[Chip]) {
        self.state.publish(OutboundEvent::ChipMenu {
            player_id: player.to_string(),
            table: self.table.to_string(),
            chips: chips.to_vec(),
        });
    }

    fn close_menu(&mut self, player: &str) {
        self.state.publish(OutboundEvent::MenuClosed {
            player_id: player.to_string(),
        });
    }
}

impl SessionSink for TableHost<'_> {
    fn save_session(&mut self, record: SessionRecord) {
        self.state.sessions.save(record);
    }
}

impl SpinListener for TableHost<'_> {}

impl Clock for TableHost<'_> {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

pub struct Engine {
    tables: BTreeMap<String, Game>,
    host: HostState,
    raw_tables: TableStore,
    tables_path: PathBuf,
    house: Arc<House>,
    phases: PhaseConfig,
    admins: BTreeSet<String>,
    rng: StdRng,
}

impl Engine {
    pub fn new(
        config: &ServiceConfig,
        tables: TableStore,
        tables_path: PathBuf,
        sessions: SessionStore,
        events: broadcast::Sender<OutboundEvent>,
        rng: StdRng,
    ) -> anyhow::Result<Self> {
        let phases = config.phases()?;
        let mut engine = Self {
            tables: BTreeMap::new(),
            host: HostState {
                ledger: Ledger::new(config.starting_balance),
                templates: Templates::with_overrides(&config.messages),
                sessions,
                events,
                next_visual: 0,
            },
            raw_tables: tables,
            tables_path,
            house: Arc::new(config.house()),
            phases,
            admins: config.admins.iter().cloned().collect(),
            rng,
        };

        if engine.raw_tables.is_empty() {
            info!(table = DEFAULT_TABLE, "no tables stored; creating default table");
            engine
                .raw_tables
                .insert(DEFAULT_TABLE.to_string(), RawTableSettings::default());
            engine.persist();
        }
        let stored: Vec<(String, RawTableSettings)> = engine
            .raw_tables
            .iter()
            .map(|(name, raw)| (name.clone(), raw.clone()))
            .collect();
        for (name, raw) in stored {
            let settings = resolve_table(&name, &raw, &engine.house);
            engine.open_table(name, settings);
        }
        Ok(engine)
    }

    #[cfg(test)]
    pub fn table(&self, name: &str) -> Option<&Game> {
        self.tables.get(name)
    }

    #[cfg(test)]
    pub fn balance(&self, player: &str) -> u64 {
        self.host.ledger.balance(player)
    }

    /// Drive the engine until shutdown or until every mailbox handle is dropped.
    pub async fn run(mut self, mut mailbox: mpsc::Receiver<Command>, tick: Duration) {
        let mut interval = time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(),
                command = mailbox.recv() => match command {
                    Some(Command::Shutdown { response }) => {
                        self.shutdown();
                        let _ = response.send(());
                        return;
                    }
                    Some(command) => self.handle(command),
                    None => {
                        self.shutdown();
                        return;
                    }
                },
            }
        }
    }

    /// Advance every table by one tick and publish the resulting state.
    pub fn tick(&mut self) {
        for (name, game) in self.tables.iter_mut() {
            let mut host = TableHost {
                table: name,
                state: &mut self.host,
            };
            game.tick(&mut host, &mut self.rng);
            self.host.publish(OutboundEvent::State {
                table: name.clone(),
                payload: state_message(game),
            });
        }
    }

    /// Close every table, refunding open stakes.
    pub fn shutdown(&mut self) {
        for (name, game) in self.tables.iter_mut() {
            let mut host = TableHost {
                table: name,
                state: &mut self.host,
            };
            game.shutdown(&mut host);
        }
        info!(
            tables = self.tables.len(),
            accounts = self.host.ledger.accounts(),
            "engine stopped"
        );
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Join {
                player,
                table,
                response,
            } => {
                let _ = response.send(self.join(&player, &table));
            }
            Command::Leave { player, response } => {
                let result = self.seated_call(&player, |game, host| {
                    game.leave(host, &player);
                    Ok(Reply::Done)
                });
                let _ = response.send(result);
            }
            Command::SelectChip {
                player,
                chip,
                response,
            } => {
                let result = self.seated_call(&player, |game, host| {
                    let slot = game.select_chip(host, &player, &chip)?;
                    Ok(Reply::Slot { slot })
                });
                let _ = response.send(result);
            }
            Command::MoveChip {
                player,
                direction,
                response,
            } => {
                let result = self.seated_call(&player, |game, host| {
                    game.move_chip(host, &player, direction)
                        .map(|slot| Reply::Slot { slot })
                        .ok_or(CommandError::IllegalMove)
                });
                let _ = response.send(result);
            }
            Command::SelectSlot {
                player,
                slot,
                response,
            } => {
                let result = self.seated_call(&player, |game, host| {
                    if game.select_slot(host, &player, slot) {
                        Ok(Reply::Slot { slot })
                    } else {
                        Err(CommandError::IllegalMove)
                    }
                });
                let _ = response.send(result);
            }
            Command::NewBet { player, response } => {
                let result = self.seated_call(&player, |game, host| {
                    let index = game.new_bet(host, &player)?;
                    Ok(Reply::Bet { index })
                });
                let _ = response.send(result);
            }
            Command::Balance { player, response } => {
                let balance = self.host.ledger.ensure(&player);
                let _ = response.send(Ok(Reply::Balance { balance }));
            }
            Command::History {
                player,
                limit,
                response,
            } => {
                let receiver = self.host.sessions.history(&player, limit);
                tokio::spawn(async move {
                    let sessions = receiver.await.unwrap_or_default();
                    let _ = response.send(Ok(Reply::History { sessions }));
                });
            }
            Command::Tables { response } => {
                let tables = self.tables.values().map(summary).collect();
                let _ = response.send(Ok(Reply::Tables { tables }));
            }
            Command::Admin {
                player,
                table,
                action,
                response,
            } => {
                let result = self
                    .require_admin(&player)
                    .and_then(|()| self.admin(&player, &table, action));
                let _ = response.send(result);
            }
            Command::CreateTable {
                player,
                name,
                settings,
                response,
            } => {
                let result = self
                    .require_admin(&player)
                    .and_then(|()| self.create_table(name, settings));
                let _ = response.send(result);
            }
            Command::DeleteTable {
                player,
                name,
                response,
            } => {
                let result = self
                    .require_admin(&player)
                    .and_then(|()| self.delete_table(&name));
                let _ = response.send(result);
            }
            Command::RemoveSession {
                player,
                id,
                response,
            } => {
                let result = self.require_admin(&player).map(|()| {
                    info!(player = %player, %id, "session removal requested");
                    self.host.sessions.remove(id);
                    Reply::Done
                });
                let _ = response.send(result);
            }
            Command::Disconnect { player } => {
                if let Some(table) = self.table_of(&player) {
                    debug!(player = %player, table = %table, "seated player disconnected");
                    self.call(&table, |game, host| game.leave(host, &player));
                }
            }
            Command::Shutdown { response } => {
                self.shutdown();
                let _ = response.send(());
            }
        }
    }

    fn join(&mut self, player: &str, table: &str) -> Result<Reply, CommandError> {
        if !self.tables.contains_key(table) {
            return Err(CommandError::UnknownTable(table.to_string()));
        }
        if let Some(seated) = self.table_of(player) {
            if seated != table {
                return Err(CommandError::SeatedElsewhere(seated));
            }
        }
        self.host.ledger.ensure(player);
        let seat = self
            .call(table, |game, host| game.join(host, player))
            .ok_or_else(|| CommandError::UnknownTable(table.to_string()))??;
        Ok(Reply::Seated {
            table: table.to_string(),
            seat,
        })
    }

    fn admin(
        &mut self,
        player: &str,
        table: &str,
        action: AdminAction,
    ) -> Result<Reply, CommandError> {
        let game = self
            .tables
            .get_mut(table)
            .ok_or_else(|| CommandError::UnknownTable(table.to_string()))?;
        match action {
            AdminAction::SetRule { rule, enabled } => {
                let rule = rule.parse::<GameRule>()?;
                game.set_rule(rule, enabled)?;
            }
            AdminAction::SetSlot { slot, enabled } => {
                let slot = slot.parse::<Slot>()?;
                game.set_slot_enabled(slot, enabled);
            }
            AdminAction::SetChip { chip, enabled } => game.set_chip_enabled(&chip, enabled)?,
            AdminAction::SetHouseAccount { account } => {
                let account = account
                    .map(|account| account.trim().to_string())
                    .filter(|account| !account.is_empty());
                game.set_house_account(account);
            }
            AdminAction::SetStartTime { seconds } => game.set_start_time(seconds)?,
            AdminAction::SetPlayerLimits { min, max } => game.set_player_limits(min, max)?,
        }
        info!(admin = player, table, "table settings changed");
        self.raw_tables
            .insert(table.to_string(), RawTableSettings::from(game.settings()));
        self.persist();
        Ok(Reply::Done)
    }

    fn create_table(
        &mut self,
        name: String,
        raw: RawTableSettings,
    ) -> Result<Reply, CommandError> {
        if self.tables.contains_key(&name) {
            return Err(CommandError::TableExists(name));
        }
        let settings = resolve_table(&name, &raw, &self.house);
        self.raw_tables
            .insert(name.clone(), RawTableSettings::from(&settings));
        self.persist();
        info!(table = %name, "table created");
        self.open_table(name, settings);
        Ok(Reply::Done)
    }

    fn delete_table(&mut self, name: &str) -> Result<Reply, CommandError> {
        let mut game = self
            .tables
            .remove(name)
            .ok_or_else(|| CommandError::UnknownTable(name.to_string()))?;
        let mut host = TableHost {
            table: name,
            state: &mut self.host,
        };
        game.shutdown(&mut host);
        self.raw_tables.remove(name);
        self.persist();
        info!(table = name, "table deleted");
        Ok(Reply::Done)
    }

    fn open_table(&mut self, name: String, settings: TableSettings) {
        let mut game = Game::new(name.clone(), settings, self.phases, self.house.clone());
        let mut host = TableHost {
            table: &name,
            state: &mut self.host,
        };
        game.open(&mut host);
        self.tables.insert(name, game);
    }

    fn require_admin(&self, player: &str) -> Result<(), CommandError> {
        if self.admins.contains(player) {
            Ok(())
        } else {
            warn!(player, "admin command refused");
            Err(CommandError::NotAdmin)
        }
    }

    fn table_of(&self, player: &str) -> Option<String> {
        self.tables
            .iter()
            .find(|(_, game)| game.is_seated(player))
            .map(|(name, _)| name.clone())
    }

    /// Run `f` against `table` with a host bound to it.
    fn call<T>(
        &mut self,
        table: &str,
        f: impl FnOnce(&mut Game, &mut TableHost<'_>) -> T,
    ) -> Option<T> {
        let game = self.tables.get_mut(table)?;
        let mut host = TableHost {
            table,
            state: &mut self.host,
        };
        Some(f(game, &mut host))
    }

    /// Run `f` against the table `player` is seated at.
    fn seated_call(
        &mut self,
        player: &str,
        f: impl FnOnce(&mut Game, &mut TableHost<'_>) -> Result<Reply, CommandError>,
    ) -> Result<Reply, CommandError> {
        let table = self.table_of(player).ok_or(CommandError::NotSeated)?;
        self.call(&table, f).unwrap_or(Err(CommandError::NotSeated))
    }

    fn persist(&self) {
        if let Err(err) = save_tables(&self.tables_path, &self.raw_tables) {
            error!(path = %self.tables_path.display(), "Table store write failed: {err}");
        }
    }
}

fn summary(game: &Game) -> TableSummary {
    TableSummary {
        name: game.name().to_string(),
        table_type: game.settings().table_type.as_str(),
        state: game.state().as_str(),
        players: game.player_count(),
        max_players: game.settings().max_players,
    }
}

fn state_message(game: &Game) -> TableStateMessage {
    TableStateMessage {
        state: game.state().as_str(),
        round: game.round(),
        players: game.players().map(|(player, _)| player.clone()).collect(),
        time_remaining: game.active_task().map(|task| task.remaining()),
        winner: game.winner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_tables;
    use crate::ingress::Mailbox;
    use croupier_types::roulette::GameState;
    use rand::SeedableRng;
    use tokio::sync::oneshot;

    struct Fixture {
        engine: Engine,
        events: broadcast::Receiver<OutboundEvent>,
        tables_path: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            selecting_ticks: 2,
            spin_ticks: 1,
            ending_ticks: 0,
            starting_balance: 1_000,
            admins: vec!["root".to_string()],
            ..ServiceConfig::default()
        };
        let mut tables = TableStore::new();
        tables.insert(
            DEFAULT_TABLE.to_string(),
            RawTableSettings {
                start_time: Some(1),
                ..RawTableSettings::default()
            },
        );
        let tables_path = dir.path().join("tables.yml");
        let sessions = SessionStore::open(&dir.path().join("sessions.db"), 64).unwrap();
        let (events, receiver) = broadcast::channel(1_024);
        let engine = Engine::new(
            &config,
            tables,
            tables_path.clone(),
            sessions,
            events,
            StdRng::seed_from_u64(11),
        )
        .unwrap();
        Fixture {
            engine,
            events: receiver,
            tables_path,
            _dir: dir,
        }
    }

    /// Handle a command that answers synchronously.
    fn call(
        engine: &mut Engine,
        build: impl FnOnce(crate::ingress::Response) -> Command,
    ) -> Result<Reply, CommandError> {
        let (response, mut receiver) = oneshot::channel();
        engine.handle(build(response));
        receiver.try_recv().unwrap()
    }

    fn drain(events: &mut broadcast::Receiver<OutboundEvent>) -> Vec<OutboundEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    fn chat_keys(events: &[OutboundEvent], player: &str) -> Vec<&'static str> {
        events
            .iter()
            .filter_map(|event| match event {
                OutboundEvent::Chat { player_id, key, .. } if player_id == player => Some(*key),
                _ => None,
            })
            .collect()
    }

    fn join(engine: &mut Engine, player: &str, table: &str) -> Result<Reply, CommandError> {
        call(engine, |response| Command::Join {
            player: player.to_string(),
            table: table.to_string(),
            response,
        })
    }

    #[tokio::test]
    async fn test_round_through_the_engine() {
        let mut fixture = fixture();
        let engine = &mut fixture.engine;

        assert_eq!(
            join(engine, "alice", DEFAULT_TABLE),
            Ok(Reply::Seated {
                table: DEFAULT_TABLE.to_string(),
                seat: 0
            })
        );
        assert_eq!(engine.table(DEFAULT_TABLE).unwrap().state(), GameState::Starting);
        engine.tick();
        assert_eq!(engine.table(DEFAULT_TABLE).unwrap().state(), GameState::Selecting);

        let placed = call(engine, |response| Command::SelectChip {
            player: "alice".to_string(),
            chip: "chip_100".to_string(),
            response,
        });
        assert_eq!(placed, Ok(Reply::Slot { slot: Slot::Zero }));
        let moved = call(engine, |response| Command::SelectSlot {
            player: "alice".to_string(),
            slot: Slot::Red,
            response,
        });
        assert_eq!(moved, Ok(Reply::Slot { slot: Slot::Red }));
        assert_eq!(engine.balance("alice"), 900);

        for _ in 0..3 {
            engine.tick();
        }
        let events = drain(&mut fixture.events);
        let keys = chat_keys(&events, "alice");
        assert!(keys.contains(&"bets_open"));
        assert!(keys.contains(&"spinning"));
        assert!(keys.contains(&"winner"));
        assert!(events
            .iter()
            .any(|event| matches!(event, OutboundEvent::ChipMenu { player_id, .. } if player_id == "alice")));
        assert!(events.iter().any(|event| matches!(
            event,
            OutboundEvent::Visual {
                change: VisualChange::Spawn {
                    visual: Visual::Ball,
                    ..
                },
                ..
            }
        )));

        let balance = fixture.engine.balance("alice");
        if keys.contains(&"won") {
            assert_eq!(balance, 1_100);
        } else {
            assert_eq!(balance, 900);
        }

        let (response, receiver) = oneshot::channel();
        fixture.engine.handle(Command::History {
            player: "alice".to_string(),
            limit: 10,
            response,
        });
        let Ok(Reply::History { sessions }) = receiver.await.unwrap() else {
            panic!("expected history");
        };
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].table, DEFAULT_TABLE);
        assert_eq!(sessions[0].total_staked(), 100);
    }

    #[tokio::test]
    async fn test_seat_errors() {
        let mut fixture = fixture();
        let engine = &mut fixture.engine;
        let created = call(engine, |response| Command::CreateTable {
            player: "root".to_string(),
            name: "vip".to_string(),
            settings: RawTableSettings::default(),
            response,
        });
        assert_eq!(created, Ok(Reply::Done));

        join(engine, "alice", DEFAULT_TABLE).unwrap();
        assert!(matches!(
            join(engine, "alice", "vip"),
            Err(CommandError::SeatedElsewhere(table)) if table == DEFAULT_TABLE
        ));
        let again = join(engine, "alice", DEFAULT_TABLE).unwrap_err();
        assert_eq!(again.code(), "ALREADY_SEATED");
        assert!(matches!(
            join(engine, "alice", "nowhere"),
            Err(CommandError::UnknownTable(_))
        ));

        let not_seated = call(engine, |response| Command::NewBet {
            player: "bob".to_string(),
            response,
        });
        assert!(matches!(not_seated, Err(CommandError::NotSeated)));

        let closed = call(engine, |response| Command::SelectChip {
            player: "alice".to_string(),
            chip: "chip_10".to_string(),
            response,
        })
        .unwrap_err();
        assert_eq!(closed.code(), "BETTING_CLOSED");
    }

    #[tokio::test]
    async fn test_disconnect_refunds_and_frees_seat() {
        let mut fixture = fixture();
        let engine = &mut fixture.engine;
        join(engine, "alice", DEFAULT_TABLE).unwrap();
        engine.tick();
        call(engine, |response| Command::SelectChip {
            player: "alice".to_string(),
            chip: "chip_500".to_string(),
            response,
        })
        .unwrap();
        assert_eq!(engine.balance("alice"), 500);

        engine.handle(Command::Disconnect {
            player: "alice".to_string(),
        });
        assert_eq!(engine.balance("alice"), 1_000);
        let table = engine.table(DEFAULT_TABLE).unwrap();
        assert!(!table.is_seated("alice"));
        assert_eq!(table.state(), GameState::Idle);
    }

    #[tokio::test]
    async fn test_admin_commands_are_gated_and_persisted() {
        let mut fixture = fixture();
        let engine = &mut fixture.engine;

        let refused = call(engine, |response| Command::Admin {
            player: "alice".to_string(),
            table: DEFAULT_TABLE.to_string(),
            action: AdminAction::SetStartTime { seconds: 5 },
            response,
        });
        assert!(matches!(refused, Err(CommandError::NotAdmin)));

        let rule = call(engine, |response| Command::Admin {
            player: "root".to_string(),
            table: DEFAULT_TABLE.to_string(),
            action: AdminAction::SetRule {
                rule: "surrender".to_string(),
                enabled: true,
            },
            response,
        })
        .unwrap_err();
        assert_eq!(rule.code(), "INVALID_RULE");

        let slot = call(engine, |response| Command::Admin {
            player: "root".to_string(),
            table: DEFAULT_TABLE.to_string(),
            action: AdminAction::SetSlot {
                slot: "SLOT_DOZEN_3".to_string(),
                enabled: false,
            },
            response,
        });
        assert_eq!(slot, Ok(Reply::Done));
        let rule = call(engine, |response| Command::Admin {
            player: "root".to_string(),
            table: DEFAULT_TABLE.to_string(),
            action: AdminAction::SetRule {
                rule: "la partage".to_string(),
                enabled: true,
            },
            response,
        });
        assert_eq!(rule, Ok(Reply::Done));

        let stored = load_tables(&fixture.tables_path).unwrap();
        let main = &stored[DEFAULT_TABLE];
        assert_eq!(main.disabled_slots, vec!["SLOT_DOZEN_3".to_string()]);
        assert_eq!(main.rules, vec!["la_partage".to_string()]);
        assert_eq!(main.start_time, Some(1));

        let deleted = call(&mut fixture.engine, |response| Command::DeleteTable {
            player: "root".to_string(),
            name: DEFAULT_TABLE.to_string(),
            response,
        });
        assert_eq!(deleted, Ok(Reply::Done));
        assert!(load_tables(&fixture.tables_path).unwrap().is_empty());
        let tables = call(&mut fixture.engine, |response| Command::Tables { response });
        assert_eq!(tables, Ok(Reply::Tables { tables: Vec::new() }));
    }

    #[tokio::test]
    async fn test_run_loop_shuts_down_tables() {
        let mut fixture = fixture();
        join(&mut fixture.engine, "alice", DEFAULT_TABLE).unwrap();
        fixture.engine.tick();
        call(&mut fixture.engine, |response| Command::SelectChip {
            player: "alice".to_string(),
            chip: "chip_50".to_string(),
            response,
        })
        .unwrap();

        let (sender, receiver) = mpsc::channel(8);
        let mailbox = Mailbox::new(sender);
        let engine = tokio::spawn(fixture.engine.run(receiver, Duration::from_secs(3_600)));

        let balance = mailbox
            .request(|response| Command::Balance {
                player: "alice".to_string(),
                response,
            })
            .await;
        assert_eq!(balance, Ok(Reply::Balance { balance: 950 }));

        mailbox.shutdown().await;
        engine.await.unwrap();
        let keys = chat_keys(&drain(&mut fixture.events), "alice");
        assert!(keys.contains(&"refunded"));
        assert!(matches!(
            mailbox
                .request(|response| Command::Tables { response })
                .await,
            Err(CommandError::Unavailable)
        ));
    }
}
