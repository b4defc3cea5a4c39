// The standard instrument palette.
//
// A read-only orchestra of common instruments keyed by a kebab-case name
// (`flute`, `b-flat-clarinet`, `double-bass`, `computer`, ...). The table is
// built once on first use and never mutated; `standard_instrument` hands out
// owned clones, so a player adjusting its instrument cannot affect anyone
// else's.
//
// Ranges are written MIDI (note names in the trailing comments). Missing
// notes are written pitches, mostly woodwind quarter tones. Transposition is
// the sounding offset in semitones. Dynamic ranges use the `Instrument`
// defaults.

use crate::error::InstrumentError;
use crate::instrument::{Clef, Instrument};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use Clef as C;

struct Entry {
    key: &'static str,
    name: &'static str,
    range: (f64, f64),
    systems: u32,
    /// Initial and possible clefs.
    clefs: (&'static [Clef], &'static [Clef]),
    chords: bool,
    microtones: bool,
    transposition: f64,
    missing: &'static [f64],
    program: u8,
}

#[rustfmt::skip]
const ENTRIES: &[Entry] = &[
    // Flutes and recorders
    Entry { key: "piccolo", name: "piccolo", range: (62.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: 12.0, missing: &[], program: 73 }, // d4-c7
    Entry { key: "flute", name: "flute", range: (60.0, 98.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: 0.0, missing: &[60.5, 61.5], program: 74 }, // c4-d7
    Entry { key: "alto-flute", name: "alto flute", range: (60.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -5.0, missing: &[60.5, 61.5], program: 74 }, // c4-c7
    Entry { key: "bass-flute", name: "bass flute", range: (60.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble, C::Bass]), chords: false, microtones: true, transposition: -12.0, missing: &[60.5, 61.5], program: 74 }, // c4-c7
    Entry { key: "sopranino-recorder", name: "sopranino recorder", range: (65.0, 91.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 12.0, missing: &[], program: 75 }, // f4-g6
    Entry { key: "soprano-recorder", name: "soprano recorder", range: (60.0, 86.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 12.0, missing: &[], program: 75 }, // c4-d6
    Entry { key: "alto-recorder", name: "alto recorder", range: (65.0, 91.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 75 }, // f4-g6
    Entry { key: "tenor-recorder", name: "tenor recorder", range: (60.0, 86.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 75 }, // c4-d6
    Entry { key: "consort-tenor-recorder", name: "consort tenor recorder", range: (60.0, 81.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 0.0, missing: &[61.0, 63.0], program: 75 }, // c4-a5
    Entry { key: "bass-recorder", name: "bass recorder", range: (41.0, 65.0), systems: 1, clefs: (&[C::Bass], &[C::Bass]), chords: false, microtones: false, transposition: 12.0, missing: &[], program: 75 }, // f2-f4

    // Reeds
    Entry { key: "oboe", name: "oboe", range: (58.0, 93.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: 0.0, missing: &[58.5, 59.5, 60.5, 61.5], program: 69 }, // bf3-a6
    Entry { key: "cor-anglais", name: "cor anglais", range: (58.0, 93.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -7.0, missing: &[58.5, 59.5, 60.5, 61.5], program: 70 }, // bf3-a6
    Entry { key: "oboe-d-amore", name: "oboe d'amore", range: (58.0, 93.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -3.0, missing: &[58.5, 59.5, 60.5, 61.5], program: 70 }, // bf3-a6
    Entry { key: "e-flat-clarinet", name: "E-flat clarinet", range: (52.0, 93.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: 3.0, missing: &[52.5, 53.5, 54.5, 69.5, 70.5, 71.5, 72.5, 73.5], program: 72 }, // e3-a6
    Entry { key: "b-flat-clarinet", name: "B-flat clarinet", range: (52.0, 93.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -2.0, missing: &[52.5, 53.5, 54.5, 69.5, 70.5, 71.5, 72.5, 73.5], program: 72 }, // e3-a6
    Entry { key: "a-clarinet", name: "A clarinet", range: (52.0, 93.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -3.0, missing: &[52.5, 53.5, 54.5, 69.5, 70.5, 71.5, 72.5, 73.5], program: 72 }, // e3-a6
    Entry { key: "bass-clarinet", name: "bass clarinet", range: (48.0, 91.0), systems: 1, clefs: (&[C::Treble], &[C::Treble, C::Bass]), chords: false, microtones: true, transposition: -14.0, missing: &[48.5, 49.5, 50.5, 51.5, 52.5, 53.5, 54.5, 69.5, 70.5, 71.5, 72.5, 73.5], program: 72 }, // c3-g6
    Entry { key: "sopranino-sax", name: "sopranino saxophone", range: (58.0, 90.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: 3.0, missing: &[67.5, 79.5], program: 65 }, // bf3-fs6
    Entry { key: "soprano-sax", name: "soprano saxophone", range: (58.0, 90.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -2.0, missing: &[67.5, 79.5], program: 65 }, // bf3-fs6
    Entry { key: "alto-sax", name: "alto saxophone", range: (58.0, 90.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -9.0, missing: &[67.5, 79.5], program: 66 }, // bf3-fs6
    Entry { key: "tenor-sax", name: "tenor saxophone", range: (58.0, 90.0), systems: 1, clefs: (&[C::Treble], &[C::Treble, C::Bass]), chords: false, microtones: true, transposition: -14.0, missing: &[67.5, 79.5], program: 67 }, // bf3-fs6
    Entry { key: "baritone-sax", name: "baritone saxophone", range: (58.0, 90.0), systems: 1, clefs: (&[C::Treble], &[C::Treble, C::Bass]), chords: false, microtones: true, transposition: -21.0, missing: &[67.5, 79.5], program: 68 }, // bf3-fs6
    Entry { key: "bassoon", name: "bassoon", range: (34.0, 72.0), systems: 1, clefs: (&[C::Bass], &[C::Bass, C::Tenor]), chords: false, microtones: true, transposition: 0.0, missing: &[34.5, 35.5, 36.5, 37.5, 38.5, 39.5], program: 71 }, // bf1-c5
    Entry { key: "contra-bassoon", name: "contrabassoon", range: (34.0, 69.0), systems: 1, clefs: (&[C::Bass], &[C::Bass, C::Tenor]), chords: false, microtones: true, transposition: -12.0, missing: &[34.5, 35.5, 36.5, 37.5, 38.5, 39.5], program: 71 }, // bf1-a4

    // Brass
    Entry { key: "french-horn", name: "french horn", range: (41.0, 84.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -7.0, missing: &[], program: 61 }, // f2-c6
    Entry { key: "french-horn-high", name: "french horn (high)", range: (55.0, 84.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -7.0, missing: &[], program: 61 }, // g3-c6
    Entry { key: "french-horn-low", name: "french horn (low)", range: (41.0, 79.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -7.0, missing: &[], program: 61 }, // f2-g5
    Entry { key: "c-trumpet", name: "trumpet in C", range: (54.0, 84.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: 0.0, missing: &[], program: 57 }, // fs3-c6
    Entry { key: "b-flat-trumpet", name: "B-flat trumpet", range: (54.0, 86.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: true, transposition: -2.0, missing: &[], program: 57 }, // fs3-d6
    Entry { key: "tenor-trombone", name: "tenor trombone", range: (40.0, 70.0), systems: 1, clefs: (&[C::Bass], &[C::Bass, C::Tenor]), chords: false, microtones: true, transposition: 0.0, missing: &[], program: 58 }, // e2-bf4
    Entry { key: "bass-trombone", name: "bass trombone", range: (28.0, 67.0), systems: 1, clefs: (&[C::Bass], &[C::Bass, C::Tenor]), chords: false, microtones: true, transposition: 0.0, missing: &[], program: 58 }, // e1-g4
    Entry { key: "tuba", name: "tuba", range: (26.0, 67.0), systems: 1, clefs: (&[C::Bass], &[C::Bass]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 59 }, // d1-g4

    // Keyboards and tuned percussion
    Entry { key: "marimba", name: "marimba", range: (48.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 13 }, // c3-c7
    Entry { key: "vibraphone", name: "vibraphone", range: (53.0, 89.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 12 }, // f3-f6
    Entry { key: "accordion", name: "accordion", range: (28.0, 106.0), systems: 2, clefs: (&[C::Treble], &[C::Treble, C::Bass, C::DoubleTreble, C::DoubleBass]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 22 }, // e1-bf7
    Entry { key: "glockenspiel", name: "glockenspiel", range: (53.0, 84.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 24.0, missing: &[], program: 10 }, // f3-c6
    Entry { key: "xylophone", name: "xylophone", range: (53.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 12.0, missing: &[], program: 14 }, // f3-c7
    Entry { key: "celesta", name: "celesta", range: (48.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: true, microtones: false, transposition: 12.0, missing: &[], program: 9 }, // c3-c7
    Entry { key: "crotales", name: "crotales", range: (60.0, 84.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: true, microtones: false, transposition: 24.0, missing: &[], program: 10 }, // c4-c6
    Entry { key: "piano", name: "piano", range: (21.0, 108.0), systems: 2, clefs: (&[C::Treble, C::Bass], &[C::Treble, C::Bass, C::DoubleTreble, C::DoubleBass]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 1 }, // a0-c8
    Entry { key: "piano-lh", name: "piano-lh", range: (21.0, 108.0), systems: 1, clefs: (&[C::Bass], &[C::Treble, C::Bass, C::DoubleTreble, C::DoubleBass]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 1 }, // a0-c8
    Entry { key: "harpsichord", name: "harpsichord", range: (29.0, 89.0), systems: 2, clefs: (&[C::Treble], &[C::Treble, C::Bass]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 7 }, // f1-f6
    Entry { key: "harp", name: "harp", range: (23.0, 104.0), systems: 2, clefs: (&[C::Treble], &[C::Treble, C::Bass]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 47 }, // b0-gs7
    Entry { key: "organ", name: "organ", range: (36.0, 96.0), systems: 2, clefs: (&[C::Treble], &[C::Treble, C::Bass]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 20 }, // c2-c7
    Entry { key: "organ-pedals", name: "organ pedals", range: (36.0, 67.0), systems: 1, clefs: (&[C::Bass], &[C::Bass]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 20 }, // c2-g4

    // Unpitched percussion
    Entry { key: "percussion", name: "percussion", range: (62.0, 79.0), systems: 1, clefs: (&[C::Percussion], &[C::Percussion]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 1 }, // d4-g5
    Entry { key: "tambourine", name: "tambourine", range: (71.0, 71.0), systems: 1, clefs: (&[C::Percussion], &[C::Percussion]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 1 }, // b4-b4

    // Plucked strings
    Entry { key: "guitar", name: "guitar", range: (52.0, 95.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: true, microtones: false, transposition: -12.0, missing: &[], program: 25 }, // e3-b6
    Entry { key: "mandolin", name: "mandolin", range: (55.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: true, microtones: false, transposition: 0.0, missing: &[], program: 26 }, // g3-c7

    // Voices
    Entry { key: "soprano", name: "soprano", range: (60.0, 84.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 54 }, // c4-c6
    Entry { key: "mezzo", name: "mezzo-soprano", range: (57.0, 81.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 54 }, // a3-a5
    Entry { key: "alto-voice", name: "alto", range: (53.0, 77.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 54 }, // f3-f5
    Entry { key: "countertenor", name: "countertenor", range: (52.0, 76.0), systems: 1, clefs: (&[C::Treble8vb], &[C::Treble8vb]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 54 }, // e3-e5
    Entry { key: "tenor-voice", name: "tenor", range: (48.0, 72.0), systems: 1, clefs: (&[C::Treble8vb], &[C::Treble8vb]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 54 }, // c3-c5
    Entry { key: "baritone-voice", name: "baritone", range: (45.0, 69.0), systems: 1, clefs: (&[C::Bass], &[C::Bass]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 54 }, // a2-a4
    Entry { key: "bass-voice", name: "bass", range: (40.0, 64.0), systems: 1, clefs: (&[C::Bass], &[C::Bass]), chords: false, microtones: false, transposition: 0.0, missing: &[], program: 54 }, // e2-e4

    // Bowed strings and bass guitar
    Entry { key: "violin", name: "violin", range: (55.0, 96.0), systems: 1, clefs: (&[C::Treble], &[C::Treble]), chords: true, microtones: true, transposition: 0.0, missing: &[], program: 41 }, // g3-c7
    Entry { key: "viola", name: "viola", range: (48.0, 89.0), systems: 1, clefs: (&[C::Alto], &[C::Alto, C::Treble]), chords: true, microtones: true, transposition: 0.0, missing: &[], program: 42 }, // c3-f6
    Entry { key: "viola-d-amore", name: "viola d'amore", range: (45.0, 101.0), systems: 1, clefs: (&[C::Alto], &[C::Alto, C::Treble]), chords: true, microtones: true, transposition: 0.0, missing: &[], program: 41 }, // a2-f7
    Entry { key: "cello", name: "cello", range: (36.0, 81.0), systems: 1, clefs: (&[C::Bass], &[C::Bass, C::Tenor, C::Treble]), chords: true, microtones: true, transposition: 0.0, missing: &[], program: 43 }, // c2-a5
    Entry { key: "double-bass", name: "double bass", range: (40.0, 79.0), systems: 1, clefs: (&[C::Bass], &[C::Bass, C::Tenor, C::Treble]), chords: false, microtones: true, transposition: -12.0, missing: &[], program: 44 }, // e2-g5
    Entry { key: "bass-guitar", name: "bass guitar", range: (40.0, 67.0), systems: 1, clefs: (&[C::Bass], &[C::Bass, C::Treble]), chords: true, microtones: false, transposition: -12.0, missing: &[], program: 33 }, // e2-g4

    // Electronic
    Entry { key: "computer", name: "computer", range: (0.0, 118.0), systems: 1, clefs: (&[C::Treble], &[C::Treble, C::Bass, C::DoubleTreble, C::DoubleBass]), chords: true, microtones: true, transposition: 0.0, missing: &[], program: 100 }, // c-1-bf8
];

static STANDARD_INSTRUMENTS: LazyLock<BTreeMap<&'static str, Instrument>> = LazyLock::new(|| {
    ENTRIES
        .iter()
        .map(|e| {
            let instrument = Instrument::new(e.name, e.range)
                .with_num_systems(e.systems)
                .with_clefs(e.clefs.0, e.clefs.1)
                .with_chords(e.chords)
                .with_microtones(e.microtones)
                .with_missing_notes(e.missing)
                .with_transposition(e.transposition)
                .with_midi_program(e.program);
            (e.key, instrument)
        })
        .collect()
});

/// Every standard instrument, keyed by palette name.
pub fn standard_instruments() -> &'static BTreeMap<&'static str, Instrument> {
    &STANDARD_INSTRUMENTS
}

/// An owned copy of one standard instrument.
pub fn standard_instrument(key: &str) -> Result<Instrument, InstrumentError> {
    STANDARD_INSTRUMENTS
        .get(key)
        .cloned()
        .ok_or_else(|| InstrumentError::UnknownInstrumentKey(key.to_string()))
}
