//! Network persistence.
//!
//! Two formats are supported. [`Network::save`]/[`Network::load`] use
//! bincode for whole-network snapshots. [`Network::save_to_stream`] and
//! [`Network::from_stream`] implement a compact, versionable wire format
//! for exchange with other tools:
//!
//! * integers are 4 bytes little-endian, floats 4-byte IEEE 754
//!   little-endian, bools a single byte;
//! * a length-prefixed parameter block (method tag, two option bytes,
//!   twelve floats) lets older readers skip fields appended by newer
//!   writers, and newer readers accept shorter blocks by keeping defaults
//!   for the missing tail;
//! * then the topology: layer count, input width, and per layer its width
//!   followed by each node's transfer tag, bias, link count and links,
//!   nodes and links both in descending index order. A link is a weight
//!   plus its source coordinates, with layer 0 addressing the input buffer.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{NetError, Result};
use crate::link::{Link, LinkSource};
use crate::network::{Network, TrainingMethod, TrainingOptions};
use crate::node::Node;
use crate::transfer::TransferKind;

/// Bytes in the parameter block this version writes: the method tag, the
/// two option bytes, and twelve floats.
const PARAM_BYTES: i32 = 4 + 2 + 12 * 4;

/// Little-endian primitive writes for the stream format. Blanket-implemented
/// for any [`io::Write`].
pub trait StreamWriter {
    fn write_int(&mut self, v: i32) -> Result<()>;
    fn write_bool(&mut self, v: bool) -> Result<()>;
    fn write_float(&mut self, v: f32) -> Result<()>;
}

impl<W: Write> StreamWriter for W {
    fn write_int(&mut self, v: i32) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_all(&[v as u8])?;
        Ok(())
    }

    fn write_float(&mut self, v: f32) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }
}

/// Little-endian primitive reads for the stream format. Blanket-implemented
/// for any [`io::Read`].
pub trait StreamReader {
    fn read_int(&mut self) -> Result<i32>;
    fn read_bool(&mut self) -> Result<bool>;
    fn read_float(&mut self) -> Result<f32>;
    fn skip_bytes(&mut self, n: u64) -> Result<()>;
}

impl<R: Read> StreamReader for R {
    fn read_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_bool(&mut self) -> Result<bool> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0] != 0)
    }

    fn read_float(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn skip_bytes(&mut self, n: u64) -> Result<()> {
        let skipped = io::copy(&mut self.by_ref().take(n), &mut io::sink())?;
        if skipped != n {
            return Err(NetError::invalid_data(
                "stream ended inside the parameter block",
            ));
        }
        Ok(())
    }
}

impl Network {
    /// Write the network in the stream format described in the module docs.
    pub fn save_to_stream(&self, out: &mut impl Write) -> Result<()> {
        out.write_int(PARAM_BYTES)?;
        out.write_int(self.options.method.index())?;
        out.write_bool(self.options.unity_output_derivatives)?;
        out.write_bool(self.options.bias_decay)?;
        let o = &self.options;
        for v in [
            o.output_off,
            o.output_on,
            o.learning_rate,
            o.momentum,
            o.delta0,
            o.delta_min,
            o.delta_max,
            o.mu,
            o.mu_min,
            o.mu_inc,
            o.mu_dec,
            o.weight_decay,
        ] {
            out.write_float(v)?;
        }
        out.write_int(self.num_layers() as i32)?;
        out.write_int(self.num_inputs() as i32)?;
        for layer in self.nodes.iter() {
            out.write_int(layer.len() as i32)?;
            for node in layer.iter().rev() {
                out.write_int(node.transfer.index())?;
                out.write_float(node.bias)?;
                out.write_int(node.num_links() as i32)?;
                for link in node.links().iter().rev() {
                    out.write_float(link.weight)?;
                    let (src_layer, src_index) = link.source.coordinates();
                    out.write_int(src_layer as i32)?;
                    out.write_int(src_index as i32)?;
                }
            }
        }
        Ok(())
    }

    /// Read a network from the stream format. Malformed data (unknown tags,
    /// out-of-range link sources, truncated blocks) yields
    /// [`NetError::InvalidData`]; read failures yield [`NetError::IoError`].
    pub fn from_stream(input: &mut impl Read) -> Result<Network> {
        let options = read_options(input)?;

        let num_layers = input.read_int()?;
        if num_layers < 2 {
            return Err(NetError::invalid_data("a network needs at least 2 layers"));
        }
        let num_layers = num_layers as usize;
        let input_size = input.read_int()?;
        if input_size <= 0 {
            return Err(NetError::invalid_data("non-positive input layer size"));
        }
        let mut layer_sizes = vec![input_size as usize];
        let mut nodes: Vec<Vec<Node>> = Vec::new();
        let mut num_nodes = 0usize;
        let mut num_links = 0usize;
        for l in 1..num_layers {
            let size = input.read_int()?;
            if size <= 0 {
                return Err(NetError::invalid_data("non-positive layer size"));
            }
            let size = size as usize;
            layer_sizes.push(size);
            let mut layer = Vec::new();
            for rev in 0..size {
                let mut node = Node::new(l, size - 1 - rev);
                let tag = input.read_int()?;
                node.transfer = TransferKind::from_index(tag)
                    .ok_or_else(|| NetError::invalid_data("unknown transfer function tag"))?;
                node.bias = input.read_float()?;
                let link_count = input.read_int()?;
                if link_count < 0 {
                    return Err(NetError::invalid_data("negative link count"));
                }
                let mut links = Vec::new();
                for _ in 0..link_count {
                    let weight = input.read_float()?;
                    let src_layer = input.read_int()?;
                    let src_index = input.read_int()?;
                    if src_layer < 0
                        || src_layer as usize >= l
                        || src_index < 0
                        || src_index as usize >= layer_sizes[src_layer as usize]
                    {
                        return Err(NetError::invalid_data("link source out of range"));
                    }
                    let source = if src_layer == 0 {
                        LinkSource::Input(src_index as usize)
                    } else {
                        LinkSource::Node {
                            layer: src_layer as usize,
                            index: src_index as usize,
                        }
                    };
                    links.push(Link::new(source, weight));
                }
                num_links += links.len();
                for link in links.into_iter().rev() {
                    node.push_link(link);
                }
                layer.push(node);
            }
            layer.reverse();
            num_nodes += size;
            nodes.push(layer);
        }

        let mut net = Network::empty();
        net.input = vec![0.0; layer_sizes[0]];
        net.layer_sizes = layer_sizes;
        net.nodes = nodes;
        net.num_nodes = num_nodes;
        net.num_links = num_links;
        net.options = options;
        Ok(net)
    }

    /// Snapshot the whole network (topology, weights, options) to a file
    /// with bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a bincode snapshot written by [`save`](Network::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
        let file = File::open(path)?;
        let net: Network = bincode::deserialize_from(BufReader::new(file))?;
        Ok(net)
    }

    /// The current training options as pretty-printed JSON, for logging and
    /// experiment records.
    pub fn options_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.options)?)
    }
}

/// Read the length-prefixed parameter block. A block shorter than this
/// version's leaves the remaining options at their defaults; a longer one
/// has its tail skipped. A block boundary cutting a field in half is an
/// error.
fn read_options(input: &mut impl Read) -> Result<TrainingOptions> {
    let budget = input.read_int()?;
    if budget < 0 {
        return Err(NetError::invalid_data("negative parameter block length"));
    }
    let mut budget = budget as usize;
    let mut opts = TrainingOptions::default();
    'params: {
        if budget < 4 {
            break 'params;
        }
        let tag = input.read_int()?;
        opts.method = TrainingMethod::from_index(tag)
            .ok_or_else(|| NetError::invalid_data("unknown training method tag"))?;
        budget -= 4;
        if budget < 1 {
            break 'params;
        }
        opts.unity_output_derivatives = input.read_bool()?;
        budget -= 1;
        if budget < 1 {
            break 'params;
        }
        opts.bias_decay = input.read_bool()?;
        budget -= 1;
        let fields: [&mut f32; 12] = [
            &mut opts.output_off,
            &mut opts.output_on,
            &mut opts.learning_rate,
            &mut opts.momentum,
            &mut opts.delta0,
            &mut opts.delta_min,
            &mut opts.delta_max,
            &mut opts.mu,
            &mut opts.mu_min,
            &mut opts.mu_inc,
            &mut opts.mu_dec,
            &mut opts.weight_decay,
        ];
        for field in fields {
            if budget < 4 {
                break 'params;
            }
            *field = input.read_float()?;
            budget -= 4;
        }
        input.skip_bytes(budget as u64)?;
        budget = 0;
    }
    if budget != 0 {
        return Err(NetError::invalid_data("parameter block ends mid-field"));
    }
    Ok(opts)
}
