//! Shared fixtures for unit tests: a small catalog and one example per dialect

use crate::catalog::{Card, Expansion, MemoryCatalog};
use crate::dialect::{parse_text, Dialect};
use crate::policy::StrictPolicy;
use crate::resolver::{EntityResolver, ResolvedCardList};

fn card(
    name: &str,
    card_types: &[&str],
    printings: &[&str],
    configure: impl FnOnce(&mut Card),
) -> Card {
    let mut card = Card::new(name, card_types);
    card.printings = printings.iter().map(|p| p.to_string()).collect();
    configure(&mut card);
    card
}

fn vampire(name: &str, capacity: u32, clan: &str, group: &str, disciplines: &[&str]) -> Card {
    card(name, &["Vampire"], &[], |c| {
        c.capacity = Some(capacity);
        c.clans = vec![clan.to_string()];
        c.group = Some(group.to_string());
        c.disciplines = disciplines.iter().map(|d| d.to_string()).collect();
    })
}

/// A handful of real cards and expansions
pub fn sample_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();

    catalog.add_expansion(Expansion::new("Jyhad", None));
    catalog.add_expansion(Expansion::new("Lords of the Night", Some("LotN")));
    catalog.add_expansion(Expansion::new("Third Edition", Some("Third")));
    catalog.add_expansion(Expansion::new("Legacy of Blood", Some("LoB")));
    catalog.add_expansion(Expansion::new("Promo-20051001", None));

    catalog.add_card(card(".44 Magnum", &["Equipment"], &["Jyhad", "Lords of the Night"], |c| {
        c.cost = Some("2 pool".to_string());
        c.text = "Weapon, gun.".to_string();
    }));
    catalog.add_card(card("AK-47", &["Equipment"], &["Lords of the Night"], |c| {
        c.cost = Some("5 pool".to_string());
        c.text = "Weapon, gun.".to_string();
    }));
    catalog.add_card(card("Abbot", &["Action"], &["Third Edition"], |c| {
        c.text = "+1 stealth action.".to_string();
    }));
    catalog.add_card(vampire("Abebe", 4, "Samedi", "4", &["NEC", "THN"]));
    catalog.add_card(card("Abombwe", &["Master"], &["Legacy of Blood"], |c| {
        c.disciplines = vec!["abo".to_string()];
        c.text = "Master: Discipline.".to_string();
    }));
    catalog.add_card(vampire(
        "Alan Sovereign",
        6,
        "Ventrue",
        "3",
        &["AUS", "DOM", "for", "PRE"],
    ));
    let mut advanced = vampire(
        "Alan Sovereign (Advanced)",
        6,
        "Ventrue",
        "3",
        &["AUS", "DOM", "for", "PRE"],
    );
    advanced.printings = vec!["Promo-20051001".to_string()];
    catalog.add_card(advanced);
    let mut anastasz = vampire(
        "Anastasz di Zagreb",
        11,
        "Tremere",
        "2",
        &["ANI", "AUS", "DOM", "THA"],
    );
    anastasz.aliases = vec!["Anastaszdi Zagreb".to_string()];
    catalog.add_card(anastasz);
    catalog.add_card(card("The Path of Blood", &["Master"], &["Lords of the Night"], |c| {
        c.text = "Unique master.".to_string();
    }));
    catalog.add_card(card("Pier 13, Port of Baltimore", &["Master"], &[], |c| {
        c.aliases = vec!["Pier 13".to_string()];
    }));
    catalog.add_card(card("Aaron's Feeding Razor", &["Equipment"], &[], |c| {
        c.cost = Some("1 pool".to_string());
    }));
    catalog.add_card(card("Inez \"Nurse216\" Villagrande", &["Imbued"], &[], |c| {
        c.capacity = Some(4);
        c.group = Some("4".to_string());
    }));

    catalog
}

/// Parse `text` as `dialect` and resolve it strictly; panics on failure
pub fn resolve_strict(catalog: &MemoryCatalog, dialect: Dialect, text: &str) -> ResolvedCardList {
    let mut parser = dialect.parser();
    let holder = parse_text(parser.as_mut(), text);
    assert!(
        parser.validate(&holder),
        "{dialect} rejected its input: {:?}",
        holder.malformed()
    );
    EntityResolver::new(catalog)
        .resolve(&holder, &mut StrictPolicy)
        .unwrap()
}

pub const CARD_SET_EXAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<physicalcardset sutekh_xml_version="1.3" name="Test Set 1" author="A test author" inuse="No">
  <comment>A test comment</comment>
  <card count="1" expansion="Jyhad" name=".44 Magnum"/>
  <card count="3" expansion="None Specified" name=".44 Magnum"/>
  <card count="1" expansion="LotN" name="AK-47"/>
</physicalcardset>
"#;

pub const ABSTRACT_SET_EXAMPLE: &str = r#"<abstractcardset sutekh_xml_version="1.1" name="Abstract Set" author="A test author">
  <annotations/>
  <card count="2" name="Abbot"/>
  <card count="1" name="The Path of Blood"/>
</abstractcardset>
"#;

pub const CARD_LIST_EXAMPLE: &str = r#"<cards sutekh_xml_version="1.0">
  <card count="1" expansion="Legacy of Blood" name="Abombwe"/>
  <card count="1" name="Abebe"/>
</cards>
"#;

pub const ARDB_DECK_EXAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<deck generator="Anarch Revolt Deck Builder" formatVersion="-TODO-1.0" databaseVersion="20090126">
  <name>Test Deck</name>
  <author>Anon Y Mous</author>
  <description>Simple test deck.</description>
  <date>2009-02-10</date>
  <crypt size="4" min="6" max="11" avg="8.50">
    <vampire databaseID="11" count="1">
      <adv/>
      <name>Alan Sovereign</name>
      <set>Promo-20051001</set>
      <disciplines>AUS DOM for PRE</disciplines>
      <clan>Ventrue</clan>
      <capacity>6</capacity>
      <group>3</group>
    </vampire>
    <vampire databaseID="12" count="1">
      <adv>(Advanced)</adv>
      <name>Alan Sovereign</name>
      <set>Promo-20051001</set>
      <capacity>6</capacity>
    </vampire>
    <vampire databaseID="13" count="2">
      <adv/>
      <name>Anastasz di Zagreb</name>
      <capacity>11</capacity>
    </vampire>
  </crypt>
  <library size="5">
    <card databaseID="1" count="4">
      <name>.44 Magnum</name>
      <set>Jyhad</set>
      <type>Equipment</type>
    </card>
    <card databaseID="2" count="1">
      <name>AK-47</name>
      <set>LotN</set>
      <type>Equipment</type>
    </card>
  </library>
</deck>
"#;

pub const ARDB_INV_EXAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<inventory generator="Anarch Revolt Deck Builder" formatVersion="-TODO-1.0" databaseVersion="20090126">
  <date>2009-02-10</date>
  <crypt size="1">
    <vampire databaseID="12" have="1" spare="0" need="0">
      <adv>(Advanced)</adv>
      <name>Alan Sovereign</name>
    </vampire>
  </crypt>
  <library size="3">
    <card databaseID="3" have="2" spare="0" need="0">
      <name>Abbot</name>
    </card>
    <card databaseID="20" have="1" spare="0" need="2">
      <name>The Path of Blood</name>
    </card>
  </library>
</inventory>
"#;

pub const ARDB_TEXT_EXAMPLE: &str = "\
Deck Name : Test Deck
Author : Anon Y Mous
Description :
Simple test deck.

http://www.example.com/

Crypt [4 vampires] Capacity min: 6 max: 11 average: 8.50
------------------------------------------------------------
1x Alan Sovereign (ADV)    6   AUS DOM for PRE        Ventrue:3
1x Alan Sovereign          6   AUS DOM for PRE        Ventrue:3
2x Anastasz di Zagreb      11  ANI AUS DOM THA        Tremere:2

Library [5 cards]
Equipment [4]
  4x .44 Magnum

Master [1]
  1x The Path of Blood
";

pub const ELDB_INV_EXAMPLE: &str = "\
\"ELDB - Inventory\"
\"Alan Sovereign (ADV)\",1,0,\"\",\"Crypt\"
\"Aaron`s Feeding Razor\",1,0,\"\",\"Library\"
\"The Path of Blood\",2,0,\"\",\"Library\"
\"Abbot\",0,1,\"\",\"Library\"
";

pub const ELDB_DECK_EXAMPLE: &str = "\
\"Test Deck\"
\"Anon Y Mous\"
\"Simple test deck.\"
3
4
\"Alan Sovereign (ADV)\"
\"Anastasz di Zagreb\"
\"Anastasz di Zagreb\"
\"Aaron`s Feeding Razor\"
\".44 Magnum\"
\".44 Magnum\"
\"The Path of Blood\"
";

pub const ELDB_HTML_EXAMPLE: &str = r#"<html>
<head>
<title>Test Deck</title>
</head>
<body>
<h1>Test Deck</h1>
<p>Author: Anon Y Mous</p>
<p>Description: Simple test deck.</p>
<h2>Crypt [3]</h2>
<ul>
<li>1x Alan Sovereign (ADV)</li>
<li>2x Anastasz di Zagreb</li>
</ul>
<h2>Library [5]</h2>
<h3>Equipment [4]</h3>
<ul>
<li>3x .44 Magnum</li>
<li>1x Aaron&#39;s Feeding Razor</li>
</ul>
<h3>Master [1]</h3>
<ul>
<li>1x The Path of Blood</li>
</ul>
</body>
</html>
"#;

pub const SL_DECK_EXAMPLE: &str = "\
***SL***TITLE***
Test Deck
***SL***AUTHOR***
Anon Y Mous
***SL***CREATED***
2009-02-10
***SL***DESCRIPTION***
Simple test deck.
***SL***CRYPT***
1 Alan Sovereign (ADV)
2 Anastasz di Zagreb
***SL***LIBRARY***
3 .44 Magnum
1 The Path of Blood
***SL***ENDDECK***
";

pub const SL_INV_EXAMPLE: &str = "\
***SL***CRYPT***
1;0;Alan Sovereign (ADV)
2;1;Abebe
***SL***LIBRARY***
4;0;.44 Magnum
0;2;AK-47
***SL***ENDINVENTORY***
";

pub const CSV_EXAMPLE: &str = r#""Card Name", "Expansion", "Number"
".44 Magnum", "Jyhad", 1
".44 Magnum", "Unknown Expansion", 3
"AK-47", "Lords of the Night", 1
"AK-47", "Unknown Expansion", 1
"Abbot", "Third Edition", 1
"Abbot", "Unknown Expansion", 1
"Abebe", "Unknown Expansion", 1
"Abombwe", "Legacy of Blood", 1
"Abombwe", "Unknown Expansion", 1
"Alan Sovereign (Advanced)", "Promo-20051001", 1
"The Path of Blood", "Lords of the Night", 1
"#;

pub const LACKEY_EXAMPLE: &str = "\
4\t.44 Magnum
1\tAaron's Feeding Razor
1\tThe Path of Blood
Crypt:
1\tAlan Sovereign Adv
2\tAnastasz di Zagreb
";

pub const JOL_EXAMPLE: &str = "\
1x Alan Sovereign (adv)
2x Anastasz di Zagreb
Abebe

4x .44 Magnum
1x The Path of Blood
";

/// Every example with the dialect it is written in
pub const EXAMPLES: [(Dialect, &str); 14] = [
    (Dialect::SutekhCardSet, CARD_SET_EXAMPLE),
    (Dialect::SutekhAbstractSet, ABSTRACT_SET_EXAMPLE),
    (Dialect::SutekhCardList, CARD_LIST_EXAMPLE),
    (Dialect::ArdbXmlDeck, ARDB_DECK_EXAMPLE),
    (Dialect::ArdbXmlInventory, ARDB_INV_EXAMPLE),
    (Dialect::ArdbText, ARDB_TEXT_EXAMPLE),
    (Dialect::EldbInventory, ELDB_INV_EXAMPLE),
    (Dialect::EldbDeck, ELDB_DECK_EXAMPLE),
    (Dialect::EldbHtml, ELDB_HTML_EXAMPLE),
    (Dialect::SecretLibraryDeck, SL_DECK_EXAMPLE),
    (Dialect::SecretLibraryInventory, SL_INV_EXAMPLE),
    (Dialect::Csv, CSV_EXAMPLE),
    (Dialect::Lackey, LACKEY_EXAMPLE),
    (Dialect::Jol, JOL_EXAMPLE),
];
