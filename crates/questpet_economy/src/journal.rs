//! # Economy Journal
//!
//! **Append-only log of every economy operation.**
//!
//! The ledger writes one entry per applied operation *before* it changes
//! in-memory state. Upgrade attempts double as the upgrade log (stars
//! before the roll, outcome, fragments gained).
//!
//! ## Format
//!
//! ```text
//! [4 bytes: magic "QPJL"]
//! [4 bytes: version]
//!
//! Entry format:
//! [8 bytes: sequence number]
//! [1 byte: entry kind]
//! [4 bytes: payload length]
//! [N bytes: payload]
//! [4 bytes: CRC32 of above]
//! ```
//!
//! All integers little-endian. A bad CRC or a short read ends the scan:
//! everything before it is intact, everything after is a torn write.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use questpet_shared::{ExperienceSource, PetId, UserId};

use crate::error::{EconomyError, EconomyResult};
use crate::rarity::RarityTier;

/// Magic bytes identifying a journal file.
const JOURNAL_MAGIC: &[u8; 4] = b"QPJL";

/// Current journal format version.
const JOURNAL_VERSION: u32 = 1;

/// Header length in bytes.
const HEADER_LEN: u64 = 8;

/// Upper bound on a single payload. Anything larger is corruption.
const MAX_PAYLOAD: u32 = 4096;

/// One journaled operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalEntry {
    /// A user was registered with an empty wallet.
    Register {
        /// New user.
        user_id: UserId,
    },
    /// A pet was summoned.
    Summon {
        /// Owner.
        user_id: UserId,
        /// New pet.
        pet_id: PetId,
        /// Pet name.
        name: String,
        /// Drawn rarity.
        rarity: RarityTier,
        /// Powder spent.
        cost: u64,
    },
    /// Experience was applied to a pet.
    Experience {
        /// Owner.
        user_id: UserId,
        /// Pet that gained experience.
        pet_id: PetId,
        /// Event source.
        source: ExperienceSource,
        /// Experience granted after caps.
        amount: u32,
        /// Level after the grant.
        new_level: u8,
        /// Powder rewarded for level-ups.
        reward: u64,
    },
    /// A probabilistic upgrade was rolled.
    UpgradeAttempt {
        /// Owner.
        user_id: UserId,
        /// Pet being upgraded.
        pet_id: PetId,
        /// Stars before the roll.
        current_stars: u32,
        /// Outcome.
        success: bool,
        /// Fragments credited.
        fragments_gained: u32,
        /// Powder spent.
        cost: u64,
    },
    /// Fragments were exchanged for a star.
    GuaranteedUpgrade {
        /// Owner.
        user_id: UserId,
        /// Pet being upgraded.
        pet_id: PetId,
        /// Stars before the upgrade.
        current_stars: u32,
        /// Fragments consumed.
        fragments_spent: u32,
    },
    /// Powder credited from outside the pet economy (goals, tasks).
    PowderCredit {
        /// Recipient.
        user_id: UserId,
        /// Amount credited.
        amount: u64,
    },
}

impl JournalEntry {
    /// Entry kind tag.
    const fn kind(&self) -> u8 {
        match self {
            Self::Summon { .. } => 1,
            Self::Experience { .. } => 2,
            Self::UpgradeAttempt { .. } => 3,
            Self::GuaranteedUpgrade { .. } => 4,
            Self::PowderCredit { .. } => 5,
            Self::Register { .. } => 6,
        }
    }

    /// User the entry belongs to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::Summon { user_id, .. }
            | Self::Experience { user_id, .. }
            | Self::UpgradeAttempt { user_id, .. }
            | Self::GuaranteedUpgrade { user_id, .. }
            | Self::PowderCredit { user_id, .. }
            | Self::Register { user_id } => *user_id,
        }
    }

    /// Serializes the payload (without kind tag).
    fn encode(&self) -> EconomyResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(40);

        match self {
            Self::Register { user_id } => {
                buf.extend_from_slice(&user_id.to_le_bytes());
            }
            Self::Summon { user_id, pet_id, name, rarity, cost } => {
                buf.extend_from_slice(&user_id.to_le_bytes());
                buf.extend_from_slice(&pet_id.to_le_bytes());
                let name_len = u16::try_from(name.len()).map_err(|_| {
                    EconomyError::Journal(format!("pet name of {} bytes cannot be journaled", name.len()))
                })?;
                buf.extend_from_slice(&name_len.to_le_bytes());
                buf.extend_from_slice(name.as_bytes());
                buf.push(*rarity as u8);
                buf.extend_from_slice(&cost.to_le_bytes());
            }
            Self::Experience { user_id, pet_id, source, amount, new_level, reward } => {
                buf.extend_from_slice(&user_id.to_le_bytes());
                buf.extend_from_slice(&pet_id.to_le_bytes());
                buf.push(*source as u8);
                buf.extend_from_slice(&amount.to_le_bytes());
                buf.push(*new_level);
                buf.extend_from_slice(&reward.to_le_bytes());
            }
            Self::UpgradeAttempt { user_id, pet_id, current_stars, success, fragments_gained, cost } => {
                buf.extend_from_slice(&user_id.to_le_bytes());
                buf.extend_from_slice(&pet_id.to_le_bytes());
                buf.extend_from_slice(&current_stars.to_le_bytes());
                buf.push(u8::from(*success));
                buf.extend_from_slice(&fragments_gained.to_le_bytes());
                buf.extend_from_slice(&cost.to_le_bytes());
            }
            Self::GuaranteedUpgrade { user_id, pet_id, current_stars, fragments_spent } => {
                buf.extend_from_slice(&user_id.to_le_bytes());
                buf.extend_from_slice(&pet_id.to_le_bytes());
                buf.extend_from_slice(&current_stars.to_le_bytes());
                buf.extend_from_slice(&fragments_spent.to_le_bytes());
            }
            Self::PowderCredit { user_id, amount } => {
                buf.extend_from_slice(&user_id.to_le_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
            }
        }

        Ok(buf)
    }

    /// Deserializes a payload of the given kind.
    fn decode(kind: u8, data: &[u8]) -> Option<Self> {
        let mut r = Cursor { data, pos: 0 };

        let entry = match kind {
            1 => Self::Summon {
                user_id: r.u64()?,
                pet_id: r.u64()?,
                name: r.string()?,
                rarity: RarityTier::from_u8(r.u8()?)?,
                cost: r.u64()?,
            },
            2 => Self::Experience {
                user_id: r.u64()?,
                pet_id: r.u64()?,
                source: ExperienceSource::from_u8(r.u8()?)?,
                amount: r.u32()?,
                new_level: r.u8()?,
                reward: r.u64()?,
            },
            3 => Self::UpgradeAttempt {
                user_id: r.u64()?,
                pet_id: r.u64()?,
                current_stars: r.u32()?,
                success: r.u8()? != 0,
                fragments_gained: r.u32()?,
                cost: r.u64()?,
            },
            4 => Self::GuaranteedUpgrade {
                user_id: r.u64()?,
                pet_id: r.u64()?,
                current_stars: r.u32()?,
                fragments_spent: r.u32()?,
            },
            5 => Self::PowderCredit {
                user_id: r.u64()?,
                amount: r.u64()?,
            },
            6 => Self::Register { user_id: r.u64()? },
            _ => return None,
        };

        (r.pos == data.len()).then_some(entry)
    }
}

/// Little-endian reader over a payload.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    fn string(&mut self) -> Option<String> {
        let len = usize::from(self.take::<2>().map(u16::from_le_bytes)?);
        let bytes = self.data.get(self.pos..self.pos + len)?;
        self.pos += len;
        String::from_utf8(bytes.to_vec()).ok()
    }
}

/// A journal entry with its sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalRecord {
    /// Sequence number (unique, monotonic).
    pub seq: u64,
    /// The operation.
    pub entry: JournalEntry,
}

/// Append-only journal file.
pub struct Journal {
    /// Path to the journal file.
    path: PathBuf,
    /// Writer state, locked as one.
    inner: Mutex<JournalWriter>,
}

/// Where records go. A failed write must be cut back to the intact length.
trait RecordSink: Write {
    fn truncate(&mut self, len: u64) -> std::io::Result<()>;
}

impl RecordSink for File {
    fn truncate(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

struct JournalWriter<S: RecordSink = File> {
    sink: S,
    /// Intact bytes, header included.
    len: u64,
    next_seq: u64,
    /// Set when a failed write could not be cut back.
    poisoned: bool,
}

impl<S: RecordSink> JournalWriter<S> {
    fn new(sink: S, len: u64, next_seq: u64) -> Self {
        Self {
            sink,
            len,
            next_seq,
            poisoned: false,
        }
    }

    /// Writes one whole record or nothing.
    fn append(&mut self, entry: &JournalEntry) -> EconomyResult<u64> {
        if self.poisoned {
            return Err(EconomyError::Journal(
                "journal has a partial record that could not be removed".to_string(),
            ));
        }

        let seq = self.next_seq;
        let record = frame(seq, entry)?;

        if let Err(e) = self.sink.write_all(&record).and_then(|()| self.sink.flush()) {
            if let Err(cut) = self.sink.truncate(self.len) {
                tracing::error!("Failed to remove partial journal record: {}", cut);
                self.poisoned = true;
            }
            return Err(journal_error("journal write failed", &e));
        }

        self.len += record.len() as u64;
        self.next_seq += 1;
        Ok(seq)
    }
}

/// Builds a complete record: header, payload, CRC.
fn frame(seq: u64, entry: &JournalEntry) -> EconomyResult<Vec<u8>> {
    let payload = entry.encode()?;
    let payload_len = u32::try_from(payload.len())
        .ok()
        .filter(|&len| len <= MAX_PAYLOAD)
        .ok_or_else(|| {
            EconomyError::Journal(format!(
                "entry payload of {} bytes exceeds {MAX_PAYLOAD}",
                payload.len()
            ))
        })?;

    let mut record = Vec::with_capacity(8 + 1 + 4 + payload.len() + 4);
    record.extend_from_slice(&seq.to_le_bytes());
    record.push(entry.kind());
    record.extend_from_slice(&payload_len.to_le_bytes());
    record.extend_from_slice(&payload);
    let crc = crc32fast::hash(&record);
    record.extend_from_slice(&crc.to_le_bytes());
    Ok(record)
}

fn header() -> [u8; 8] {
    let mut header = [0u8; 8];
    header[..4].copy_from_slice(JOURNAL_MAGIC);
    header[4..].copy_from_slice(&JOURNAL_VERSION.to_le_bytes());
    header
}

impl Journal {
    /// Opens or creates a journal.
    ///
    /// An existing journal is scanned to resume the sequence. A torn tail
    /// is cut off so new entries follow the last intact one.
    ///
    /// # Errors
    ///
    /// `Journal` if the file cannot be opened or has a foreign header.
    pub fn open(path: impl AsRef<Path>) -> EconomyResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| journal_error("failed to open journal", &e))?;

        let len = file
            .metadata()
            .map_err(|e| journal_error("failed to read journal metadata", &e))?
            .len();

        let (intact_len, next_seq) = if len == 0 {
            (&file)
                .write_all(&header())
                .and_then(|()| file.sync_all())
                .map_err(|e| journal_error("failed to write journal header", &e))?;
            (HEADER_LEN, 0)
        } else {
            let scan = scan(&path)?;
            if scan.intact_len < len {
                tracing::warn!(
                    "Journal {} has a torn tail: keeping {} of {} bytes",
                    path.display(),
                    scan.intact_len,
                    len
                );
                file.set_len(scan.intact_len)
                    .map_err(|e| journal_error("failed to truncate torn tail", &e))?;
            }
            (scan.intact_len, scan.records.last().map_or(0, |r| r.seq + 1))
        };

        Ok(Self {
            path,
            inner: Mutex::new(JournalWriter::new(file, intact_len, next_seq)),
        })
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence number the next entry will get.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.inner.lock().next_seq
    }

    /// Appends an entry, written straight through to the OS.
    ///
    /// A failed write leaves no partial record behind.
    ///
    /// # Errors
    ///
    /// `Journal` if the entry is too large to journal or the write fails.
    /// The sequence number is not consumed.
    pub fn append(&self, entry: &JournalEntry) -> EconomyResult<u64> {
        self.inner.lock().append(entry)
    }

    /// Forces everything appended so far to disk.
    ///
    /// # Errors
    ///
    /// `Journal` if the sync fails.
    pub fn sync(&self) -> EconomyResult<()> {
        self.inner
            .lock()
            .sink
            .sync_all()
            .map_err(|e| journal_error("journal sync failed", &e))
    }

    /// Reads every intact record.
    ///
    /// # Errors
    ///
    /// `Journal` if the file cannot be read or has a foreign header.
    pub fn read_all(&self) -> EconomyResult<Vec<JournalRecord>> {
        let _writer = self.inner.lock();
        Ok(scan(&self.path)?.records)
    }
}

/// Result of scanning a journal file.
struct Scan {
    records: Vec<JournalRecord>,
    intact_len: u64,
}

fn scan(path: &Path) -> EconomyResult<Scan> {
    let file = File::open(path).map_err(|e| journal_error("failed to open journal for reading", &e))?;
    scan_records(BufReader::new(file))
}

/// Reads records until the end or the first damaged one.
fn scan_records(mut reader: impl Read) -> EconomyResult<Scan> {
    let mut header = [0u8; 8];
    reader
        .read_exact(&mut header)
        .map_err(|e| journal_error("failed to read journal header", &e))?;
    if &header[0..4] != JOURNAL_MAGIC {
        return Err(EconomyError::Journal("invalid journal magic".to_string()));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != JOURNAL_VERSION {
        return Err(EconomyError::Journal(format!(
            "unsupported journal version: {version}"
        )));
    }

    let mut records = Vec::new();
    let mut intact_len = HEADER_LEN;

    loop {
        let mut head = [0u8; 13];
        if reader.read_exact(&mut head).is_err() {
            break;
        }
        let seq = u64::from_le_bytes([
            head[0], head[1], head[2], head[3], head[4], head[5], head[6], head[7],
        ]);
        let kind = head[8];
        let payload_len = u32::from_le_bytes([head[9], head[10], head[11], head[12]]);
        if payload_len > MAX_PAYLOAD {
            break;
        }

        let mut payload = vec![0u8; payload_len as usize];
        let mut crc_bytes = [0u8; 4];
        if reader.read_exact(&mut payload).is_err() || reader.read_exact(&mut crc_bytes).is_err() {
            break;
        }

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&head);
        hasher.update(&payload);
        if hasher.finalize() != u32::from_le_bytes(crc_bytes) {
            break;
        }

        let Some(entry) = JournalEntry::decode(kind, &payload) else {
            break;
        };

        records.push(JournalRecord { seq, entry });
        intact_len += 13 + u64::from(payload_len) + 4;
    }

    Ok(Scan { records, intact_len })
}

fn journal_error(context: &str, err: &std::io::Error) -> EconomyError {
    EconomyError::Journal(format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_journal_path() -> PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("test_journal_{id}.qpj"))
    }

    fn sample_entries() -> Vec<JournalEntry> {
        vec![
            JournalEntry::Register { user_id: 1 },
            JournalEntry::PowderCredit { user_id: 1, amount: 500 },
            JournalEntry::Summon {
                user_id: 1,
                pet_id: 10,
                name: "불꽃이".to_string(),
                rarity: RarityTier::Epic,
                cost: 100,
            },
            JournalEntry::Experience {
                user_id: 1,
                pet_id: 10,
                source: ExperienceSource::PostLike,
                amount: 2,
                new_level: 1,
                reward: 0,
            },
            JournalEntry::UpgradeAttempt {
                user_id: 1,
                pet_id: 10,
                current_stars: 0,
                success: false,
                fragments_gained: 1,
                cost: 100,
            },
            JournalEntry::GuaranteedUpgrade {
                user_id: 1,
                pet_id: 10,
                current_stars: 0,
                fragments_spent: 20,
            },
        ]
    }

    #[test]
    fn test_append_and_read_back() {
        let path = temp_journal_path();
        let journal = Journal::open(&path).unwrap();

        for (i, entry) in sample_entries().iter().enumerate() {
            assert_eq!(journal.append(entry).unwrap(), i as u64);
        }
        journal.sync().unwrap();

        let records = journal.read_all().unwrap();
        let entries: Vec<_> = records.into_iter().map(|r| r.entry).collect();
        assert_eq!(entries, sample_entries());

        drop(journal);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_reopen_resumes_sequence() {
        let path = temp_journal_path();
        {
            let journal = Journal::open(&path).unwrap();
            journal.append(&JournalEntry::PowderCredit { user_id: 3, amount: 1 }).unwrap();
            journal.append(&JournalEntry::PowderCredit { user_id: 3, amount: 2 }).unwrap();
        }

        let journal = Journal::open(&path).unwrap();
        assert_eq!(journal.next_seq(), 2);
        assert_eq!(
            journal.append(&JournalEntry::PowderCredit { user_id: 3, amount: 3 }).unwrap(),
            2
        );
        assert_eq!(journal.read_all().unwrap().len(), 3);

        drop(journal);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_torn_tail_is_cut() {
        let path = temp_journal_path();
        {
            let journal = Journal::open(&path).unwrap();
            journal.append(&JournalEntry::PowderCredit { user_id: 5, amount: 50 }).unwrap();
        }

        // Simulate a crash halfway through the second record.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[1, 0, 0, 0, 0, 0, 0, 0, 5, 16]).unwrap();
        }

        let journal = Journal::open(&path).unwrap();
        assert_eq!(journal.next_seq(), 1);
        journal.append(&JournalEntry::PowderCredit { user_id: 5, amount: 60 }).unwrap();

        let amounts: Vec<_> = journal
            .read_all()
            .unwrap()
            .into_iter()
            .map(|r| match r.entry {
                JournalEntry::PowderCredit { amount, .. } => amount,
                other => panic!("unexpected entry {other:?}"),
            })
            .collect();
        assert_eq!(amounts, vec![50, 60]);

        drop(journal);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_corrupted_crc_stops_scan() {
        let path = temp_journal_path();
        {
            let journal = Journal::open(&path).unwrap();
            journal.append(&JournalEntry::PowderCredit { user_id: 7, amount: 1 }).unwrap();
            journal.append(&JournalEntry::PowderCredit { user_id: 7, amount: 2 }).unwrap();
        }

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let journal = Journal::open(&path).unwrap();
        assert_eq!(journal.read_all().unwrap().len(), 1);

        drop(journal);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_foreign_file_rejected() {
        let path = temp_journal_path();
        std::fs::write(&path, b"NOPE\x01\x00\x00\x00").unwrap();
        assert!(matches!(Journal::open(&path), Err(EconomyError::Journal(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_oversized_entry_rejected_without_losing_later_ones() {
        let path = temp_journal_path();
        let journal = Journal::open(&path).unwrap();

        journal.append(&JournalEntry::Register { user_id: 1 }).unwrap();
        let err = journal
            .append(&JournalEntry::Summon {
                user_id: 1,
                pet_id: 1,
                name: "x".repeat(5000),
                rarity: RarityTier::Common,
                cost: 100,
            })
            .unwrap_err();
        assert!(matches!(err, EconomyError::Journal(_)));
        assert_eq!(
            journal.append(&JournalEntry::PowderCredit { user_id: 1, amount: 9 }).unwrap(),
            1
        );
        drop(journal);

        let journal = Journal::open(&path).unwrap();
        let records = journal.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].seq, 1);

        drop(journal);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_name_too_long_for_length_prefix() {
        let entry = JournalEntry::Summon {
            user_id: 1,
            pet_id: 1,
            name: "x".repeat(usize::from(u16::MAX) + 1),
            rarity: RarityTier::Rare,
            cost: 100,
        };
        assert!(matches!(frame(0, &entry), Err(EconomyError::Journal(_))));
    }

    /// Accepts `budget` bytes, then fails like a full disk.
    struct FullDisk {
        data: Vec<u8>,
        budget: usize,
        can_truncate: bool,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.budget == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl RecordSink for FullDisk {
        fn truncate(&mut self, len: u64) -> std::io::Result<()> {
            if !self.can_truncate {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "read-only"));
            }
            self.data.truncate(len as usize);
            Ok(())
        }
    }

    fn full_disk(can_truncate: bool) -> JournalWriter<FullDisk> {
        let sink = FullDisk {
            data: header().to_vec(),
            budget: usize::MAX,
            can_truncate,
        };
        JournalWriter::new(sink, HEADER_LEN, 0)
    }

    #[test]
    fn test_failed_write_leaves_no_partial_record() {
        let mut writer = full_disk(true);
        writer.append(&JournalEntry::PowderCredit { user_id: 2, amount: 1 }).unwrap();
        let intact = writer.sink.data.len();

        // Dies ten bytes into the record.
        writer.sink.budget = 10;
        let err = writer
            .append(&JournalEntry::PowderCredit { user_id: 2, amount: 2 })
            .unwrap_err();
        assert!(matches!(err, EconomyError::Journal(_)));
        assert_eq!(writer.sink.data.len(), intact);
        assert_eq!(writer.next_seq, 1);

        writer.sink.budget = usize::MAX;
        assert_eq!(
            writer.append(&JournalEntry::PowderCredit { user_id: 2, amount: 3 }).unwrap(),
            1
        );

        let scan = scan_records(writer.sink.data.as_slice()).unwrap();
        let seen: Vec<_> = scan
            .records
            .iter()
            .map(|r| match r.entry {
                JournalEntry::PowderCredit { amount, .. } => (r.seq, amount),
                ref other => panic!("unexpected entry {other:?}"),
            })
            .collect();
        assert_eq!(seen, vec![(0, 1), (1, 3)]);
        assert_eq!(scan.intact_len, writer.sink.data.len() as u64);
    }

    #[test]
    fn test_unrecoverable_write_refuses_further_appends() {
        let mut writer = full_disk(false);
        writer.sink.budget = 5;
        assert!(writer.append(&JournalEntry::Register { user_id: 4 }).is_err());

        writer.sink.budget = usize::MAX;
        let err = writer.append(&JournalEntry::Register { user_id: 5 }).unwrap_err();
        assert!(matches!(err, EconomyError::Journal(_)));
        assert_eq!(writer.sink.data.len(), HEADER_LEN as usize + 5);
    }
}
