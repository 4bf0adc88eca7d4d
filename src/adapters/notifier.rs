//! Signal notifiers: a console writer and a last-sent dedup wrapper.

use std::io::Write;

use crate::domain::error::SigtraderError;
use crate::domain::signal::{CurrentSignal, Signal};
use crate::ports::notify_port::NotifyPort;

/// Human-readable alert text for one proposal.
pub fn format_message(signal: &CurrentSignal) -> String {
    let p = &signal.proposal;
    format!(
        concat!(
            "{} SIGNAL - BTC/USD\n",
            "  Entry:       {:.2}\n",
            "  Stop loss:   {:.2}\n",
            "  Take profit: {:.2}\n",
            "  R:R:         1:{:.1}\n",
            "  Time:        {}\n",
        ),
        p.direction,
        p.entry_price,
        p.stop_loss_price,
        p.take_profit_price,
        p.risk_reward(),
        signal.timestamp.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Key two proposals share when they are the same alert: direction and rounded entry.
pub fn dedup_key(signal: &CurrentSignal) -> String {
    format!(
        "{}-{}",
        signal.proposal.direction,
        signal.proposal.entry_price.round() as i64
    )
}

pub struct ConsoleNotifier<W: Write> {
    out: W,
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotifyPort for ConsoleNotifier<W> {
    fn notify(&mut self, signal: &CurrentSignal) -> Result<(), SigtraderError> {
        self.out.write_all(format_message(signal).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Forwards a proposal only when it differs from the last one sent.
pub struct DedupNotifier<N: NotifyPort> {
    inner: N,
    last_sent: Option<String>,
}

impl<N: NotifyPort> DedupNotifier<N> {
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            last_sent: None,
        }
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    pub fn into_inner(self) -> N {
        self.inner
    }

    /// Returns whether the signal was forwarded. Holds are never forwarded.
    pub fn dispatch(&mut self, signal: &Signal) -> Result<bool, SigtraderError> {
        let Signal::Trade(current) = signal else {
            return Ok(false);
        };
        let key = dedup_key(current);
        if self.last_sent.as_deref() == Some(key.as_str()) {
            tracing::debug!(%key, "signal already sent");
            return Ok(false);
        }
        self.inner.notify(current)?;
        tracing::info!(%key, "signal sent");
        self.last_sent = Some(key);
        Ok(true)
    }
}
