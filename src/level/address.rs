use crate::config::COLOR_CHANNELS;

/// Position of one color subchannel inside the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubchannelAddress {
    pub row: usize,
    pub col: usize,
    pub channel: usize,
}

/// Map a subchannel cursor to its (row, col, channel) in raster order:
/// rows top to bottom, pixels left to right, channels 0..3 within a pixel.
pub fn locate(cursor: usize, width: usize) -> SubchannelAddress {
    let row_len = width * COLOR_CHANNELS;
    SubchannelAddress {
        row: cursor / row_len,
        col: (cursor % row_len) / COLOR_CHANNELS,
        channel: cursor % COLOR_CHANNELS,
    }
}

/// Inverse of [`locate`].
pub fn cursor_of(address: SubchannelAddress, width: usize) -> usize {
    (address.row * width + address.col) * COLOR_CHANNELS + address.channel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(row: usize, col: usize, channel: usize) -> SubchannelAddress {
        SubchannelAddress { row, col, channel }
    }

    #[test]
    fn test_locate_walks_channels_then_columns_then_rows() {
        let width = 4;
        assert_eq!(locate(0, width), at(0, 0, 0));
        assert_eq!(locate(2, width), at(0, 0, 2));
        assert_eq!(locate(3, width), at(0, 1, 0));
        assert_eq!(locate(11, width), at(0, 3, 2));
        assert_eq!(locate(12, width), at(1, 0, 0));
    }

    #[test]
    fn test_cursor_of_inverts_locate() {
        let width = 7;
        for cursor in 0..(width * 5 * COLOR_CHANNELS) {
            assert_eq!(cursor_of(locate(cursor, width), width), cursor);
        }
    }
}
