use super::*;
use std::collections::BTreeSet;

#[test]
fn test_slot_colors_match_red_numbers() {
    for slot in Slot::values(TableType::American, &BTreeSet::new()) {
        let expected = match slot {
            Slot::Zero | Slot::DoubleZero => SlotColor::Green,
            Slot::Number(n) if RED_NUMBERS.contains(&n) => SlotColor::Red,
            Slot::Number(_) => SlotColor::Black,
            Slot::Red => SlotColor::Red,
            Slot::Black => SlotColor::Black,
            _ => SlotColor::Mixed,
        };
        assert_eq!(slot.color(), expected, "{slot}");
    }
    assert_eq!(RED_NUMBERS.len(), 18);
}

#[test]
fn test_every_pocket_in_exactly_one_member_per_group() {
    for table_type in [TableType::European, TableType::American] {
        let pockets = Slot::pockets(table_type);
        assert_eq!(pockets.len(), table_type.pocket_count());
        for pocket in pockets {
            let singles = Slot::all()
                .filter(|slot| slot.is_single() && slot.contains(pocket))
                .count();
            assert_eq!(singles, 1, "{pocket}");

            for group in SlotType::ALL {
                let hits = group
                    .members()
                    .iter()
                    .filter(|member| member.contains(pocket))
                    .count();
                let expected = if pocket.is_zero() { 0 } else { 1 };
                assert_eq!(hits, expected, "{pocket} in {group:?}");
            }
        }
    }
}

#[test]
fn test_european_values_never_contain_double_zero() {
    let values = Slot::values(TableType::European, &BTreeSet::new());
    assert!(!values.contains(&Slot::DoubleZero));
    assert!(values.contains(&Slot::Zero));
    assert_eq!(values.len(), 37 + 12);

    let american = Slot::values(TableType::American, &BTreeSet::new());
    assert!(american.contains(&Slot::DoubleZero));
    assert_eq!(american.len(), 38 + 12);
}

#[test]
fn test_disabled_slot_removed_until_enabled() {
    let mut disabled = BTreeSet::new();
    disabled.insert(Slot::Red);
    assert!(!Slot::values(TableType::American, &disabled).contains(&Slot::Red));
    assert!(!Slot::values(TableType::American, &disabled).contains(&Slot::Red));

    disabled.remove(&Slot::Red);
    assert!(Slot::values(TableType::American, &disabled).contains(&Slot::Red));
}

#[test]
fn test_group_contains() {
    assert!(Slot::Red.contains(Slot::Number(1)));
    assert!(!Slot::Red.contains(Slot::Number(2)));
    assert!(!Slot::Red.contains(Slot::Zero));
    assert!(Slot::Column(1).contains(Slot::Number(34)));
    assert!(Slot::Column(3).contains(Slot::Number(36)));
    assert!(Slot::Dozen(2).contains(Slot::Number(13)));
    assert!(!Slot::Dozen(2).contains(Slot::Number(25)));
    assert!(Slot::Low.contains(Slot::Number(18)));
    assert!(Slot::High.contains(Slot::Number(19)));
    assert!(Slot::Even.contains(Slot::Number(36)));
    assert!(!Slot::Even.contains(Slot::DoubleZero));
    assert!(Slot::Zero.contains(Slot::Zero));
    assert!(!Slot::Zero.contains(Slot::DoubleZero));
}

#[test]
fn test_slot_names_parse_back() {
    for slot in Slot::all() {
        assert_eq!(slot.name().parse::<Slot>(), Ok(slot));
    }
    assert_eq!("slot_red".parse::<Slot>(), Ok(Slot::Red));
    assert_eq!(
        "SLOT_37".parse::<Slot>(),
        Err(SlotParseError::OutOfRange { got: 37, max: 36 })
    );
    assert!(matches!(
        "SLOT_PURPLE".parse::<Slot>(),
        Err(SlotParseError::Unknown(_))
    ));
    assert!(matches!("RED".parse::<Slot>(), Err(SlotParseError::Unknown(_))));
}

#[test]
fn test_slot_serde_uses_names() {
    let json = serde_json::to_string(&Slot::Dozen(3)).unwrap();
    assert_eq!(json, "\"SLOT_DOZEN_3\"");
    let back: Slot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Slot::Dozen(3));
    assert!(serde_json::from_str::<Slot>("\"SLOT_99\"").is_err());
}

#[test]
fn test_default_multipliers_and_overrides() {
    assert_eq!(Slot::Number(17).default_multiplier(), 36);
    assert_eq!(Slot::Zero.default_multiplier(), 36);
    assert_eq!(Slot::Red.default_multiplier(), 2);
    assert_eq!(Slot::Column(2).default_multiplier(), 3);
    assert_eq!(Slot::Dozen(1).default_multiplier(), 3);

    let mut overrides = std::collections::BTreeMap::new();
    overrides.insert(Slot::Red, 3);
    let paytable = Paytable::new(overrides);
    assert_eq!(paytable.multiplier(Slot::Red), 3);
    assert_eq!(paytable.multiplier(Slot::Black), 2);
}

#[test]
fn test_chance_strings() {
    assert_eq!(Slot::Number(5).chance(TableType::European), "1/37 (2.7%)");
    assert_eq!(Slot::DoubleZero.chance(TableType::American), "1/38 (2.6%)");
    assert_eq!(Slot::Red.chance(TableType::European), "18/37 (48.6%)");
    assert_eq!(Slot::Dozen(1).chance(TableType::American), "12/38 (31.6%)");
}

#[test]
fn test_win_type_payouts() {
    assert_eq!(WinType::Normal.payout(100, 2), 200);
    assert_eq!(WinType::Normal.payout(100, 36), 3_600);
    assert_eq!(WinType::LaPartage.payout(100, 2), 50);
    assert_eq!(WinType::Surrender.payout(101, 2), 50);
    assert_eq!(WinType::EnPrison.payout(100, 2), 100);
}

#[test]
fn test_rule_constraints() {
    assert_eq!(
        GameRule::EnPrison.validate(TableType::European, 2),
        Err(RuleError::EnPrisonRequiresSinglePlayer { min_players: 2 })
    );
    assert!(GameRule::EnPrison.validate(TableType::European, 1).is_ok());
    assert_eq!(
        GameRule::Surrender.validate(TableType::European, 1),
        Err(RuleError::SurrenderRequiresAmerican)
    );
    assert!(GameRule::Surrender.validate(TableType::American, 4).is_ok());
    assert!(GameRule::LaPartage.validate(TableType::American, 4).is_ok());
}

#[test]
fn test_raw_settings_resolve_leniently() {
    let house = House::default();
    let raw: RawTableSettings = serde_yaml::from_str(
        r#"
table_type: american
min_players: 2
max_players: 6
rules: [surrender, en_prison, juggling]
disabled_slots: [SLOT_00, SLOT_MAGENTA]
disabled_chips: [chip_10, chip_3]
house_account: "  bank  "
"#,
    )
    .unwrap();
    let (settings, warnings) = raw.resolve(&house);

    assert_eq!(settings.table_type, TableType::American);
    assert_eq!(settings.min_players, 2);
    assert_eq!(settings.max_players, 6);
    assert!(settings.rules.surrender);
    assert!(!settings.rules.en_prison);
    assert!(settings.disabled_slots.contains(&Slot::DoubleZero));
    assert_eq!(settings.disabled_slots.len(), 1);
    assert!(settings.disabled_chips.contains("chip_10"));
    assert_eq!(settings.house_account.as_deref(), Some("bank"));
    assert_eq!(warnings.len(), 4);
    assert!(warnings.contains(&SettingsWarning::Rule("juggling".to_string())));
    assert!(warnings.contains(&SettingsWarning::Slot("SLOT_MAGENTA".to_string())));
    assert!(warnings.contains(&SettingsWarning::Chip("chip_3".to_string())));
}

#[test]
fn test_raw_settings_bad_limits_default() {
    let raw = RawTableSettings {
        table_type: Some("martian".to_string()),
        min_players: Some(5),
        max_players: Some(2),
        ..Default::default()
    };
    let (settings, warnings) = raw.resolve(&House::default());
    assert_eq!(settings.table_type, TableType::European);
    assert_eq!(settings.min_players, DEFAULT_MIN_PLAYERS);
    assert_eq!(settings.max_players, DEFAULT_MAX_PLAYERS);
    assert_eq!(warnings.len(), 2);
}

#[test]
fn test_settings_store_roundtrip() {
    let house = House::default();
    let mut settings = TableSettings {
        table_type: TableType::American,
        max_bets: 5,
        ..Default::default()
    };
    settings.rules.set(GameRule::Surrender, true);
    settings.disabled_slots.insert(Slot::Column(2));
    settings.disabled_chips.insert("chip_5000".to_string());

    let raw = RawTableSettings::from(&settings);
    let yaml = serde_yaml::to_string(&raw).unwrap();
    let parsed: RawTableSettings = serde_yaml::from_str(&yaml).unwrap();
    let (resolved, warnings) = parsed.resolve(&house);
    assert!(warnings.is_empty());
    assert_eq!(resolved, settings);
}

#[test]
fn test_cheapest_chip_respects_disabled() {
    let house = House::default();
    let mut disabled = BTreeSet::new();
    assert_eq!(house.cheapest(&disabled).map(|c| c.price), Some(10));
    disabled.insert("chip_10".to_string());
    assert_eq!(house.cheapest(&disabled).map(|c| c.price), Some(50));
}

#[test]
fn test_game_state_helpers() {
    assert!(GameState::Idle.accepts_players());
    assert!(GameState::Starting.accepts_players());
    assert!(!GameState::Selecting.accepts_players());
    assert!(GameState::Spinning.is_locked());
    assert!(GameState::Ending.is_locked());
    assert!(!GameState::Selecting.is_locked());
}
